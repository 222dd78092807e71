use std::str::FromStr;
use std::sync::Arc;

use lockbox_core::{
    RecordPatch, SecretStore, StoreError, StoreErrorKind, VaultBlob, VaultContext, VaultError,
    VaultKey, VaultRecord, VaultResult, VaultScope, VersionToken, STORAGE_NAMESPACE, TAG_APP,
    TAG_VAULT_KIND,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::access::VaultAccess;
use crate::events::{VaultEvent, VaultSnapshot};
use crate::ops::VaultOp;

const EVENT_CAPACITY: usize = 64;

/// How write-back treats a blob that changed since it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Write-back carries the version token; a stale token is a conflict.
    #[default]
    Optimistic,
    /// Write-back replaces whatever is stored.
    LastWriterWins,
}

impl WritePolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::LastWriterWins => "last_writer_wins",
        }
    }
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "last_writer_wins" | "lww" => Ok(Self::LastWriterWins),
            other => Err(format!("unknown write policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub write_policy: WritePolicy,
    /// Extra fetch-apply-commit rounds after a conflict.
    #[serde(default)]
    pub conflict_retries: u32,
}

/// A decoded vault plus the version it was read at. Consumed by
/// [`VaultStore::commit`].
#[derive(Debug)]
pub struct FetchedVault {
    context: VaultContext,
    access: VaultAccess,
    blob: VaultBlob,
    version: Option<VersionToken>,
}

impl FetchedVault {
    #[must_use]
    pub fn context(&self) -> &VaultContext {
        &self.context
    }

    #[must_use]
    pub fn blob(&self) -> &VaultBlob {
        &self.blob
    }

    /// `None` when the vault did not exist yet.
    #[must_use]
    pub fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> Vec<VaultRecord> {
        self.blob.values().cloned().collect()
    }

    pub fn apply(&mut self, op: VaultOp) -> VaultResult<Option<VaultRecord>> {
        op.validate()?;
        Ok(op.apply(&mut self.blob))
    }
}

/// Read-merge-write engine over one consolidated blob per vault.
pub struct VaultStore {
    client: Arc<dyn SecretStore>,
    config: StoreConfig,
    events: broadcast::Sender<VaultEvent>,
}

impl VaultStore {
    #[must_use]
    pub fn new(client: Arc<dyn SecretStore>) -> Self {
        Self::with_config(client, StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(client: Arc<dyn SecretStore>, config: StoreConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            config,
            events,
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }

    /// Records of the vault; empty when the scope lacks account or region.
    #[instrument(level = "debug", skip(self, scope, access), fields(kind = %access.kind()))]
    pub async fn list(
        &self,
        scope: &VaultScope,
        access: &VaultAccess,
    ) -> VaultResult<Vec<VaultRecord>> {
        if !scope.is_configured() {
            debug!(event = "vault_list_unconfigured");
            return Ok(Vec::new());
        }
        let fetched = self.fetch(scope, access).await?;
        let records = fetched.records();
        self.publish_snapshot(&fetched.access, &records);
        Ok(records)
    }

    #[instrument(level = "debug", skip(self, scope, access), fields(kind = %access.kind()))]
    pub async fn fetch(&self, scope: &VaultScope, access: &VaultAccess) -> VaultResult<FetchedVault> {
        let context = scope.resolve(access.kind())?;
        let key = context.collection_path.clone();
        let stored = match self.client.read(&key).await {
            Ok(stored) => stored,
            Err(err) if err.kind == StoreErrorKind::NotFound => None,
            Err(err) => return Err(self.store_failure(&key, err)),
        };

        let (blob, version) = match stored {
            None => {
                debug!(event = "vault_not_found", key = %key);
                (VaultBlob::new(), None)
            }
            Some(secret) => {
                let blob = match secret.data {
                    Some(raw) => access.decode_offloaded(&key, raw).await?,
                    None => VaultBlob::new(),
                };
                (blob, Some(secret.version))
            }
        };
        debug!(event = "vault_fetched", key = %key, records = blob.len());

        Ok(FetchedVault {
            context,
            access: access.clone(),
            blob,
            version,
        })
    }

    /// Re-encodes and writes the whole blob back under the configured policy.
    #[instrument(level = "debug", skip(self, fetched), fields(kind = %fetched.access.kind()))]
    pub async fn commit(&self, fetched: FetchedVault) -> VaultResult<VersionToken> {
        let FetchedVault {
            context,
            access,
            blob,
            version,
        } = fetched;
        let key = context.collection_path;
        let payload = access.encode_offloaded(&key, &blob).await?;
        let policy = self.config.write_policy;

        let written = match version {
            None => {
                let tags = vec![
                    (TAG_APP.to_string(), STORAGE_NAMESPACE.to_string()),
                    (TAG_VAULT_KIND.to_string(), access.kind().as_str().to_string()),
                ];
                match self.client.create(&key, &payload, &tags).await {
                    Ok(version) => Ok(version),
                    Err(err)
                        if err.kind == StoreErrorKind::AlreadyExists
                            && policy == WritePolicy::LastWriterWins =>
                    {
                        debug!(event = "vault_create_exists", key = %key);
                        self.client.write(&key, &payload, None).await
                    }
                    Err(err) => Err(err),
                }
            }
            Some(expected) => {
                let expected = match policy {
                    WritePolicy::Optimistic => Some(&expected),
                    WritePolicy::LastWriterWins => None,
                };
                self.client.write(&key, &payload, expected).await
            }
        };
        let written = written.map_err(|err| self.store_failure(&key, err))?;

        debug!(event = "vault_committed", key = %key, records = blob.len(), policy = %policy);
        let records: Vec<VaultRecord> = blob.into_values().collect();
        self.publish_snapshot(&access, &records);
        Ok(written)
    }

    pub async fn create(
        &self,
        scope: &VaultScope,
        access: &VaultAccess,
        record: VaultRecord,
    ) -> VaultResult<VaultRecord> {
        let created = self.run(scope, access, VaultOp::create(record)).await?;
        created.ok_or(VaultError::InvalidRecord("record was not stored"))
    }

    pub async fn update(
        &self,
        scope: &VaultScope,
        access: &VaultAccess,
        id: &str,
        patch: RecordPatch,
    ) -> VaultResult<VaultRecord> {
        let op = VaultOp::Update {
            id: id.to_string(),
            patch,
        };
        let updated = self.run(scope, access, op).await?;
        updated.ok_or(VaultError::InvalidRecord("record was not stored"))
    }

    /// Returns the removed record; removing an unknown id is not an error.
    pub async fn remove(
        &self,
        scope: &VaultScope,
        access: &VaultAccess,
        id: &str,
    ) -> VaultResult<Option<VaultRecord>> {
        let op = VaultOp::Remove { id: id.to_string() };
        self.run(scope, access, op).await
    }

    /// The embedded password, or the value behind `externalSecretRef`.
    #[instrument(level = "debug", skip(self, record), fields(id = %record.id))]
    pub async fn reveal_password(&self, record: &VaultRecord) -> VaultResult<Option<String>> {
        if let Some(password) = record.password.as_deref().filter(|value| !value.is_empty()) {
            return Ok(Some(password.to_string()));
        }
        let Some(reference) = record
            .external_secret_ref
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        else {
            return Ok(None);
        };
        let key = VaultKey::external(reference);
        match self.client.read(&key).await {
            Ok(secret) => Ok(secret.and_then(|secret| secret.data)),
            Err(err) if err.kind == StoreErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.store_failure(&key, err)),
        }
    }

    #[instrument(level = "debug", skip(self, scope, access, op), fields(kind = %access.kind()))]
    async fn run(
        &self,
        scope: &VaultScope,
        access: &VaultAccess,
        op: VaultOp,
    ) -> VaultResult<Option<VaultRecord>> {
        op.validate()?;
        let mut attempt = 0;
        loop {
            let mut fetched = self.fetch(scope, access).await?;
            let affected = fetched.apply(op.clone())?;
            match self.commit(fetched).await {
                Ok(_) => return Ok(affected),
                Err(VaultError::Conflict { key }) if attempt < self.config.conflict_retries => {
                    attempt += 1;
                    warn!(event = "vault_conflict_retry", key = %key, attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn store_failure(&self, key: &VaultKey, err: StoreError) -> VaultError {
        let mapped = VaultError::from_store(key.as_str(), err);
        if let VaultError::AccessDenied { message, .. } = &mapped {
            warn!(event = "vault_access_denied", key = %key, error = %message);
            let _ = self.events.send(VaultEvent::AccessDenied {
                key: key.clone(),
                message: message.clone(),
            });
        } else {
            debug!(event = "vault_store_failed", key = %key, error = %mapped.as_code());
        }
        mapped
    }

    fn publish_snapshot(&self, access: &VaultAccess, records: &[VaultRecord]) {
        if self.events.receiver_count() == 0 {
            return;
        }
        let _ = self.events.send(VaultEvent::Snapshot(VaultSnapshot {
            kind: access.kind(),
            records: records.to_vec(),
        }));
    }
}
