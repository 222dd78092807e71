use std::path::PathBuf;

use lockbox_core::VaultScope;
use lockbox_store::{StoreConfig, WritePolicy};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_USER_ID: &str = "local";

/// Contents of `~/.lockbox/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CliConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub write_policy: WritePolicy,
    #[serde(default)]
    pub conflict_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_iterations: Option<u32>,
}

impl CliConfig {
    pub(crate) fn scope(&self) -> VaultScope {
        VaultScope {
            user_id: self
                .user_id
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            email: self.email.clone(),
            tenant: self.tenant.clone(),
            account_id: self.account_id.clone(),
            region: self.region.clone(),
            department: self.department.clone(),
            profile: self.profile.clone(),
        }
    }

    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig {
            write_policy: self.write_policy,
            conflict_retries: self.conflict_retries,
        }
    }
}
