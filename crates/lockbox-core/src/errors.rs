use thiserror::Error;

use crate::store::{StoreError, StoreErrorKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("missing_context: {field} is required")]
    MissingContext { field: &'static str },
    #[error("invalid_vault_kind: {0}")]
    InvalidVaultKind(String),
    #[error("invalid_segment: {field} = {value:?}")]
    InvalidSegment { field: &'static str, value: String },
    #[error("access_denied: {key}: {message}")]
    AccessDenied { key: String, message: String },
    #[error("corrupt_vault: {key}: {message}")]
    CorruptVault { key: String, message: String },
    #[error("decryption_error: {0}")]
    Decryption(String),
    #[error("transport_error: {0}")]
    Transport(String),
    #[error("conflict: {key} changed since it was read")]
    Conflict { key: String },
    #[error("invalid_record: {0}")]
    InvalidRecord(&'static str),
    #[error("vault_locked")]
    Locked,
}

impl VaultError {
    #[must_use]
    pub const fn as_code(&self) -> &'static str {
        match self {
            Self::MissingContext { .. } => "missing_context",
            Self::InvalidVaultKind(_) => "invalid_vault_kind",
            Self::InvalidSegment { .. } => "invalid_segment",
            Self::AccessDenied { .. } => "access_denied",
            Self::CorruptVault { .. } => "corrupt_vault",
            Self::Decryption(_) => "decryption_error",
            Self::Transport(_) => "transport_error",
            Self::Conflict { .. } => "conflict",
            Self::InvalidRecord(_) => "invalid_record",
            Self::Locked => "vault_locked",
        }
    }

    /// Maps a secret-store failure for `key` onto the vault taxonomy.
    #[must_use]
    pub fn from_store(key: &str, err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::AccessDenied => Self::AccessDenied {
                key: key.to_string(),
                message: err.message,
            },
            StoreErrorKind::Conflict | StoreErrorKind::AlreadyExists => Self::Conflict {
                key: key.to_string(),
            },
            StoreErrorKind::NotFound | StoreErrorKind::Other => Self::Transport(err.message),
        }
    }
}

pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_vault_errors() {
        let denied = VaultError::from_store("k", StoreError::access_denied("nope"));
        assert_eq!(
            denied,
            VaultError::AccessDenied {
                key: "k".to_string(),
                message: "nope".to_string()
            }
        );
        let conflict = VaultError::from_store("k", StoreError::conflict("stale"));
        assert_eq!(conflict.as_code(), "conflict");
        let other = VaultError::from_store("k", StoreError::other("timeout"));
        assert_eq!(other, VaultError::Transport("timeout".to_string()));
    }

    #[test]
    fn invalid_kind_message_carries_the_value() {
        let err = VaultError::InvalidVaultKind("anything-else".to_string());
        assert!(err.to_string().contains("anything-else"));
        assert_eq!(err.as_code(), "invalid_vault_kind");
    }
}
