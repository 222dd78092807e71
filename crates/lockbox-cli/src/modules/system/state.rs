use std::fs;
use std::path::PathBuf;

use lockbox_store::UnlockMaterial;

use super::config::lockbox_dir;

const STATE_FILE: &str = "state.json";

fn state_path() -> anyhow::Result<PathBuf> {
    Ok(lockbox_dir()?.join(STATE_FILE))
}

pub(crate) fn state_exists() -> anyhow::Result<bool> {
    Ok(state_path()?.exists())
}

pub(crate) fn load_state() -> anyhow::Result<UnlockMaterial> {
    let path = state_path()?;
    if !path.exists() {
        anyhow::bail!("lockbox is not initialized; run `lockbox init` first");
    }
    let contents = fs::read_to_string(&path)?;
    let material = serde_json::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("state file is unreadable ({}): {err}", path.display()))?;
    Ok(material)
}

pub(crate) fn save_state(material: &UnlockMaterial) -> anyhow::Result<()> {
    let path = state_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(material)?;
    fs::write(path, contents)?;
    Ok(())
}
