use clap::Parser;
use std::io::{self, Write};

use lockbox_core::{record_schema, VaultKind};

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::records::{handle_path, CommandContext};
use crate::modules::system::{
    apply_env_overrides, handle_config_command, handle_init, load_config, save_config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let mut config = load_config()?;
    let mut effective = config.clone();
    apply_env_overrides(&mut effective);
    let kind: VaultKind = cli.kind.parse()?;
    let master_password = cli.master_password.filter(|value| !value.is_empty());

    match cli.command {
        Command::Config(args) => {
            if handle_config_command(args, &mut config, &effective)? {
                save_config(&config)?;
            }
        }
        Command::Init(args) => {
            handle_init(args, master_password, &effective).await?;
        }
        Command::Path => {
            handle_path(&effective, kind)?;
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&record_schema())?);
        }
        command => {
            let ctx = CommandContext::new(&effective, kind, master_password)?;
            handle_command(command, &ctx).await?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

pub(crate) fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let password = rpassword::read_password()?;
    if password.trim().is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(password)
}
