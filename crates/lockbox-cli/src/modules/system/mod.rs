mod actions;
pub(crate) mod args;
pub(crate) mod config;
mod state;
pub(crate) mod types;

pub(crate) use actions::handle_init;
pub(crate) use config::{
    apply_env_overrides, handle_config_command, load_config, save_config, store_dir,
};
pub(crate) use state::load_state;
pub(crate) use types::CliConfig;
