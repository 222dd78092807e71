use clap::{Args, Subcommand};

#[derive(Args)]
pub struct InitArgs {
    #[arg(long, help = "Replace existing unlock state (existing personal vaults become unreadable)")]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the effective configuration")]
    Show,
    #[command(about = "Set a configuration value")]
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    #[arg(help = "Key, e.g. region, account_id, department, write_policy")]
    pub key: String,
    #[arg(help = "Value; empty string clears optional keys")]
    pub value: String,
}
