use lockbox_crypto::{KdfParams, DEFAULT_PBKDF2_ITERATIONS};
use lockbox_store::UnlockMaterial;
use tracing::info;

use super::state::{save_state, state_exists};
use super::types::CliConfig;
use crate::cli_args::InitArgs;
use crate::prompt_password;

pub(crate) async fn handle_init(
    args: InitArgs,
    master_password: Option<String>,
    config: &CliConfig,
) -> anyhow::Result<()> {
    if state_exists()? && !args.force {
        anyhow::bail!("lockbox is already initialized; pass --force to replace it");
    }
    let iterations = config.kdf_iterations.unwrap_or(DEFAULT_PBKDF2_ITERATIONS);
    let kdf = KdfParams::pbkdf2(iterations);
    kdf.ensure_setup_strength()?;
    let password = match master_password {
        Some(password) => password,
        None => {
            let password = prompt_password("New master password: ")?;
            let confirm = prompt_password("Repeat master password: ")?;
            if password != confirm {
                anyhow::bail!("passwords do not match");
            }
            password
        }
    };
    if password.trim().is_empty() {
        anyhow::bail!("password is required");
    }

    let material = UnlockMaterial::create(&password, kdf).await?;
    save_state(&material)?;
    info!(event = "state_initialized", iterations);
    println!("initialized");
    Ok(())
}
