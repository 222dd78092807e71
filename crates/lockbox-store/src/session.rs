use std::sync::Arc;

use lockbox_core::{RecordPatch, VaultError, VaultKind, VaultRecord, VaultResult, VaultScope};
use lockbox_crypto::{
    create_verifier, derive_key, generate_salt, unlock, KdfParams, SecretKey, UnlockError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::access::VaultAccess;
use crate::events::VaultSnapshot;
use crate::mirror::{CacheSink, SinkError, TrayMirror};
use crate::vault::VaultStore;

/// What has to be persisted between runs to unlock again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockMaterial {
    pub salt: String,
    pub verifier: String,
    pub kdf: KdfParams,
}

impl UnlockMaterial {
    /// First-time setup: fresh salt, derived key and verifier.
    pub async fn create(password: &str, kdf: KdfParams) -> Result<Self, SessionError> {
        kdf.ensure_setup_strength()
            .map_err(|err| SessionError::Kdf(err.to_string()))?;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            let salt = generate_salt();
            let key = derive_key(&password, &salt, &kdf)
                .map_err(|err| SessionError::Kdf(err.to_string()))?;
            let verifier =
                create_verifier(&key).map_err(|err| SessionError::Internal(err.to_string()))?;
            Ok(Self {
                salt,
                verifier,
                kdf,
            })
        })
        .await
        .map_err(|err| SessionError::Internal(err.to_string()))?
    }

    /// Derives the master key on the blocking pool and checks it against the
    /// verifier.
    pub async fn unlock_key(&self, password: &str) -> Result<SecretKey, SessionError> {
        let password = password.to_string();
        let material = self.clone();
        tokio::task::spawn_blocking(move || {
            unlock(&password, &material.salt, &material.verifier, &material.kdf)
        })
        .await
        .map_err(|err| SessionError::Internal(err.to_string()))?
        .map_err(|err| match err {
            UnlockError::InvalidPassword => SessionError::InvalidPassword,
            UnlockError::Kdf(err) => SessionError::Kdf(err.to_string()),
        })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid_password")]
    InvalidPassword,
    #[error("kdf_error: {0}")]
    Kdf(String),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("internal_error: {0}")]
    Internal(String),
}

/// One unlocked identity: the master key, the vault store and the tray
/// mirror fed from the store's snapshots.
pub struct Session {
    scope: VaultScope,
    key: Arc<SecretKey>,
    store: Arc<VaultStore>,
    mirror: Arc<TrayMirror>,
    follower: JoinHandle<()>,
}

impl Session {
    #[instrument(level = "debug", skip(password, material, scope, store, sink), fields(user_id = %scope.user_id))]
    pub async fn unlock(
        password: &str,
        material: &UnlockMaterial,
        scope: VaultScope,
        store: Arc<VaultStore>,
        sink: Arc<dyn CacheSink>,
    ) -> Result<Self, SessionError> {
        let key = material.unlock_key(password).await?;
        let mirror = Arc::new(TrayMirror::new(sink));
        let follower = tokio::spawn(Arc::clone(&mirror).follow(store.subscribe()));
        info!(event = "session_unlocked", user_id = %scope.user_id);
        Ok(Self {
            scope,
            key: Arc::new(key),
            store,
            mirror,
            follower,
        })
    }

    #[must_use]
    pub fn scope(&self) -> &VaultScope {
        &self.scope
    }

    #[must_use]
    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    #[must_use]
    pub fn mirror(&self) -> &TrayMirror {
        &self.mirror
    }

    #[must_use]
    pub fn access(&self, kind: VaultKind) -> VaultAccess {
        match kind {
            VaultKind::Personal => VaultAccess::Personal(Arc::clone(&self.key)),
            VaultKind::Work => VaultAccess::Work,
        }
    }

    pub async fn list(&self, kind: VaultKind) -> VaultResult<Vec<VaultRecord>> {
        self.store.list(&self.scope, &self.access(kind)).await
    }

    pub async fn create(&self, kind: VaultKind, record: VaultRecord) -> VaultResult<VaultRecord> {
        self.store.create(&self.scope, &self.access(kind), record).await
    }

    pub async fn update(
        &self,
        kind: VaultKind,
        id: &str,
        patch: RecordPatch,
    ) -> VaultResult<VaultRecord> {
        self.store
            .update(&self.scope, &self.access(kind), id, patch)
            .await
    }

    pub async fn remove(&self, kind: VaultKind, id: &str) -> VaultResult<Option<VaultRecord>> {
        self.store.remove(&self.scope, &self.access(kind), id).await
    }

    /// Reads both vaults and syncs the mirror with them directly.
    pub async fn refresh_mirror(&self) -> Result<bool, SessionError> {
        let mut snapshots = Vec::with_capacity(VaultKind::ALL.len());
        for kind in VaultKind::ALL {
            snapshots.push(VaultSnapshot {
                kind,
                records: self.list(kind).await?,
            });
        }
        Ok(self.mirror.sync(&snapshots).await?)
    }

    /// Stops following the store, empties the tray cache and drops the key.
    pub async fn lock(mut self) -> Result<(), SessionError> {
        self.follower.abort();
        let _ = (&mut self.follower).await;
        self.mirror.clear().await?;
        info!(event = "session_locked", user_id = %self.scope.user_id);
        Ok(())
    }
}

impl Drop for Session {
    // A session dropped without `lock()` must not keep mirroring snapshots.
    fn drop(&mut self) {
        self.follower.abort();
    }
}
