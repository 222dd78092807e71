use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lockbox_crypto::MIN_PBKDF2_ITERATIONS;
use lockbox_store::WritePolicy;
use tracing::warn;

use super::types::CliConfig;
use crate::cli_args::{ConfigArgs, ConfigCommand};

const CONFIG_FILE: &str = "config.yaml";
const STORE_DIR: &str = "vaults";

pub(crate) fn lockbox_dir() -> anyhow::Result<PathBuf> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".lockbox"))
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(lockbox_dir()?.join(CONFIG_FILE))
}

/// The config file as written on disk, without environment overrides.
pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path = %path.display(), error = %err);
            return Ok(CliConfig::default());
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(event = "config_parse_failed", path = %path.display(), error = %err);
            Ok(CliConfig::default())
        }
    }
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub(crate) fn apply_env_overrides(config: &mut CliConfig) {
    let text_overrides: [(&str, &mut Option<String>); 7] = [
        ("LOCKBOX_USER_ID", &mut config.user_id),
        ("LOCKBOX_EMAIL", &mut config.email),
        ("LOCKBOX_TENANT", &mut config.tenant),
        ("LOCKBOX_ACCOUNT_ID", &mut config.account_id),
        ("LOCKBOX_REGION", &mut config.region),
        ("LOCKBOX_DEPARTMENT", &mut config.department),
        ("LOCKBOX_PROFILE", &mut config.profile),
    ];
    for (name, slot) in text_overrides {
        if let Ok(value) = env::var(name) {
            *slot = non_empty(&value);
        }
    }
    if let Ok(value) = env::var("LOCKBOX_STORE_DIR") {
        config.store_dir = non_empty(&value).map(PathBuf::from);
    }
    if let Ok(value) = env::var("LOCKBOX_WRITE_POLICY") {
        match value.parse::<WritePolicy>() {
            Ok(policy) => config.write_policy = policy,
            Err(_) => {
                warn!(event = "config_invalid", field = "LOCKBOX_WRITE_POLICY", value = %value);
            }
        }
    }
    if let Ok(value) = env::var("LOCKBOX_CONFLICT_RETRIES") {
        match value.trim().parse::<u32>() {
            Ok(retries) => config.conflict_retries = retries,
            Err(_) => {
                warn!(event = "config_invalid", field = "LOCKBOX_CONFLICT_RETRIES", value = %value);
            }
        }
    }
    if let Ok(value) = env::var("LOCKBOX_KDF_ITERATIONS") {
        match value.trim().parse::<u32>() {
            Ok(iterations) => {
                if iterations < MIN_PBKDF2_ITERATIONS {
                    warn!(
                        event = "config_invalid",
                        field = "LOCKBOX_KDF_ITERATIONS",
                        value = %value,
                        minimum = MIN_PBKDF2_ITERATIONS
                    );
                }
                config.kdf_iterations = Some(iterations);
            }
            Err(_) => {
                warn!(event = "config_invalid", field = "LOCKBOX_KDF_ITERATIONS", value = %value);
            }
        }
    }
}

pub(crate) fn store_dir(config: &CliConfig) -> anyhow::Result<PathBuf> {
    match &config.store_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(lockbox_dir()?.join(STORE_DIR)),
    }
}

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
    effective: &CliConfig,
) -> anyhow::Result<bool> {
    match args.command {
        ConfigCommand::Show => {
            print!("{}", serde_yaml::to_string(effective)?);
            Ok(false)
        }
        ConfigCommand::Set(args) => {
            set_value(config, &args.key, &args.value)?;
            Ok(true)
        }
    }
}

fn set_value(config: &mut CliConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let key = key.trim().to_ascii_lowercase().replace('-', "_");
    match key.as_str() {
        "user_id" => config.user_id = non_empty(value),
        "email" => config.email = non_empty(value),
        "tenant" => config.tenant = non_empty(value),
        "account_id" => config.account_id = non_empty(value),
        "region" => config.region = non_empty(value),
        "department" => config.department = non_empty(value),
        "profile" => config.profile = non_empty(value),
        "store_dir" => config.store_dir = non_empty(value).map(PathBuf::from),
        "write_policy" => {
            config.write_policy = value.parse().map_err(|err: String| anyhow::anyhow!(err))?;
        }
        "conflict_retries" => {
            config.conflict_retries = value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("conflict_retries must be a number"))?;
        }
        "kdf_iterations" => {
            config.kdf_iterations = match non_empty(value) {
                Some(value) => {
                    let iterations: u32 = value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("kdf_iterations must be a number"))?;
                    if iterations < MIN_PBKDF2_ITERATIONS {
                        anyhow::bail!("kdf_iterations must be at least {MIN_PBKDF2_ITERATIONS}");
                    }
                    Some(iterations)
                }
                None => None,
            };
        }
        other => anyhow::bail!("unknown config key: {other}"),
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_updates_known_keys() {
        let mut config = CliConfig::default();
        set_value(&mut config, "region", "eu-west-1").expect("region");
        set_value(&mut config, "account-id", "123").expect("account");
        set_value(&mut config, "write_policy", "last-writer-wins").expect("policy");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.account_id.as_deref(), Some("123"));
        assert_eq!(config.write_policy, WritePolicy::LastWriterWins);
    }

    #[test]
    fn empty_value_clears_optional_keys() {
        let mut config = CliConfig {
            region: Some("eu-west-1".to_string()),
            ..CliConfig::default()
        };
        set_value(&mut config, "region", "").expect("clear");
        assert!(config.region.is_none());
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let mut config = CliConfig::default();
        assert!(set_value(&mut config, "colour", "blue").is_err());
        assert!(set_value(&mut config, "write_policy", "sometimes").is_err());
        assert!(set_value(&mut config, "conflict_retries", "many").is_err());
        assert!(set_value(&mut config, "kdf_iterations", "1").is_err());
        assert!(config.kdf_iterations.is_none());
        set_value(&mut config, "kdf_iterations", "250000").expect("iterations");
        assert_eq!(config.kdf_iterations, Some(250_000));
    }

    #[test]
    fn config_roundtrips_through_yaml() {
        let config = CliConfig {
            account_id: Some("123".to_string()),
            region: Some("eu-west-1".to_string()),
            write_policy: WritePolicy::LastWriterWins,
            ..CliConfig::default()
        };
        let yaml = serde_yaml::to_string(&config).expect("yaml");
        assert!(yaml.contains("last_writer_wins"));
        let parsed: CliConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }
}
