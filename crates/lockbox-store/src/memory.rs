use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use lockbox_core::{SecretStore, StoreError, StoreResult, StoredSecret, VaultKey, VersionToken};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    data: Option<String>,
    tags: Vec<(String, String)>,
}

impl Entry {
    fn version(&self) -> VersionToken {
        VersionToken::of(self.data.as_deref().unwrap_or_default())
    }
}

/// Process-local [`SecretStore`]. Keys can be marked as denied to simulate
/// an IAM refusal.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Entry>>,
    denied: RwLock<HashSet<String>>,
}

impl MemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` verbatim, bypassing any encoding.
    pub async fn insert_raw(&self, key: &VaultKey, data: Option<String>) {
        self.entries.write().await.insert(
            key.as_str().to_string(),
            Entry {
                data,
                tags: Vec::new(),
            },
        );
    }

    pub async fn raw(&self, key: &VaultKey) -> Option<String> {
        self.entries
            .read()
            .await
            .get(key.as_str())
            .and_then(|entry| entry.data.clone())
    }

    pub async fn tags(&self, key: &VaultKey) -> Vec<(String, String)> {
        self.entries
            .read()
            .await
            .get(key.as_str())
            .map(|entry| entry.tags.clone())
            .unwrap_or_default()
    }

    pub async fn deny(&self, key: &VaultKey) {
        self.denied.write().await.insert(key.as_str().to_string());
    }

    async fn check_allowed(&self, key: &VaultKey) -> StoreResult<()> {
        if self.denied.read().await.contains(key.as_str()) {
            return Err(StoreError::access_denied(format!(
                "not authorized to access {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn read(&self, key: &VaultKey) -> StoreResult<Option<StoredSecret>> {
        self.check_allowed(key).await?;
        Ok(self.entries.read().await.get(key.as_str()).map(|entry| StoredSecret {
            data: entry.data.clone(),
            version: entry.version(),
        }))
    }

    async fn write(
        &self,
        key: &VaultKey,
        payload: &str,
        expected: Option<&VersionToken>,
    ) -> StoreResult<VersionToken> {
        self.check_allowed(key).await?;
        let mut entries = self.entries.write().await;
        if let Some(expected) = expected {
            let current = entries.get(key.as_str()).map(Entry::version);
            if current.as_ref() != Some(expected) {
                return Err(StoreError::conflict(format!("{key} changed since it was read")));
            }
        }
        let tags = entries
            .get(key.as_str())
            .map(|entry| entry.tags.clone())
            .unwrap_or_default();
        entries.insert(
            key.as_str().to_string(),
            Entry {
                data: Some(payload.to_string()),
                tags,
            },
        );
        Ok(VersionToken::of(payload))
    }

    async fn create(
        &self,
        key: &VaultKey,
        payload: &str,
        tags: &[(String, String)],
    ) -> StoreResult<VersionToken> {
        self.check_allowed(key).await?;
        let mut entries = self.entries.write().await;
        if entries.contains_key(key.as_str()) {
            return Err(StoreError::already_exists(format!("{key} already exists")));
        }
        entries.insert(
            key.as_str().to_string(),
            Entry {
                data: Some(payload.to_string()),
                tags: tags.to_vec(),
            },
        );
        Ok(VersionToken::of(payload))
    }
}
