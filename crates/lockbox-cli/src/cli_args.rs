use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::records::args::*;
pub use crate::modules::system::args::*;

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(about = "Lockbox password manager CLI")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "LOCKBOX_VAULT_KIND",
        default_value = "personal",
        help = "Vault to operate on (personal or work)"
    )]
    pub kind: String,
    #[arg(long, env = "LOCKBOX_MASTER_PASSWORD", hide_env_values = true)]
    pub master_password: Option<String>,
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Set the master password for this machine")]
    Init(InitArgs),
    #[command(about = "Print the secret identifier of the selected vault")]
    Path,
    List(ListArgs),
    Add(AddArgs),
    Update(UpdateArgs),
    #[command(name = "rm")]
    Remove(RemoveArgs),
    Show(ShowArgs),
    #[command(about = "Print the current one-time code of a record")]
    Otp(OtpArgs),
    #[command(about = "Copy a record's password to the clipboard")]
    Copy(CopyArgs),
    Config(ConfigArgs),
    #[command(about = "Print the JSON Schema of a vault record")]
    Schema,
}
