use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::VaultKey;

/// Opaque token identifying one stored revision of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Token derived from the stored payload itself.
    #[must_use]
    pub fn of(payload: &str) -> Self {
        Self(blake3::hash(payload.as_bytes()).to_hex().to_string())
    }

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSecret {
    /// `None` when the secret exists but carries no value.
    pub data: Option<String>,
    pub version: VersionToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    AccessDenied,
    AlreadyExists,
    Conflict,
    NotFound,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::AccessDenied, message)
    }

    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::AlreadyExists, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Conflict, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote secret store addressed by identifier.
///
/// Implementations handle their own transport retries; callers never retry
/// inside the vault core.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when the identifier does not exist.
    async fn read(&self, key: &VaultKey) -> StoreResult<Option<StoredSecret>>;

    /// Replaces the whole value. With `expected` set, the write must fail with
    /// [`StoreErrorKind::Conflict`] unless the current revision matches it.
    async fn write(
        &self,
        key: &VaultKey,
        payload: &str,
        expected: Option<&VersionToken>,
    ) -> StoreResult<VersionToken>;

    /// Creates a new secret; fails with [`StoreErrorKind::AlreadyExists`] when
    /// the identifier is taken.
    async fn create(
        &self,
        key: &VaultKey,
        payload: &str,
        tags: &[(String, String)],
    ) -> StoreResult<VersionToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tokens_follow_content() {
        assert_eq!(VersionToken::of("{}"), VersionToken::of("{}"));
        assert_ne!(VersionToken::of("{}"), VersionToken::of("{ }"));
        assert_eq!(VersionToken::of("").as_str().len(), 64);
    }
}
