use std::sync::Arc;

use lockbox_core::{parse_blob, VaultBlob, VaultError, VaultKey, VaultKind, VaultResult};
use lockbox_crypto::{decrypt_text, encrypt_json, SecretKey};
use tracing::{debug, warn};

/// How one vault kind is read and written. Chosen once per call from the
/// vault kind and carried through the whole cycle.
#[derive(Debug, Clone)]
pub enum VaultAccess {
    /// Sealed with the master key.
    Personal(Arc<SecretKey>),
    /// Plain JSON; access control is left to the remote store.
    Work,
}

impl VaultAccess {
    pub fn for_kind(kind: VaultKind, key: Option<Arc<SecretKey>>) -> VaultResult<Self> {
        match kind {
            VaultKind::Personal => key.map(Self::Personal).ok_or(VaultError::Locked),
            VaultKind::Work => Ok(Self::Work),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> VaultKind {
        match self {
            Self::Personal(_) => VaultKind::Personal,
            Self::Work => VaultKind::Work,
        }
    }

    pub fn encode(&self, key: &VaultKey, blob: &VaultBlob) -> VaultResult<String> {
        match self {
            Self::Work => serde_json::to_string(blob).map_err(|err| VaultError::CorruptVault {
                key: key.to_string(),
                message: err.to_string(),
            }),
            Self::Personal(secret) => {
                encrypt_json(blob, secret).map_err(|err| VaultError::CorruptVault {
                    key: key.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Blank and `null` payloads decode to an empty map. Personal payloads that do not
    /// open under the key are retried as plain JSON before being reported as
    /// corrupt.
    pub fn decode(&self, key: &VaultKey, raw: &str) -> VaultResult<VaultBlob> {
        if raw.trim().is_empty() {
            return Ok(VaultBlob::new());
        }
        match self {
            Self::Work => parse_blob(raw).map_err(|err| VaultError::CorruptVault {
                key: key.to_string(),
                message: err.to_string(),
            }),
            Self::Personal(secret) => {
                let decrypt_err = match decrypt_text(raw, secret) {
                    Ok(plaintext) => match parse_blob(&plaintext) {
                        Ok(blob) => return Ok(blob),
                        Err(err) => err.to_string(),
                    },
                    Err(err) => err.to_string(),
                };
                debug!(event = "vault_decrypt_failed", key = %key, error = %decrypt_err);
                match parse_blob(raw) {
                    Ok(blob) => {
                        warn!(event = "vault_plain_fallback", key = %key, records = blob.len());
                        Ok(blob)
                    }
                    Err(parse_err) => Err(VaultError::CorruptVault {
                        key: key.to_string(),
                        message: format!("{decrypt_err}; plain json: {parse_err}"),
                    }),
                }
            }
        }
    }

    /// [`Self::decode`] on the blocking pool for sealed payloads.
    pub async fn decode_offloaded(&self, key: &VaultKey, raw: String) -> VaultResult<VaultBlob> {
        if matches!(self, Self::Work) {
            return self.decode(key, &raw);
        }
        let access = self.clone();
        let key = key.clone();
        tokio::task::spawn_blocking(move || access.decode(&key, &raw))
            .await
            .map_err(|err| VaultError::Transport(format!("decode task failed: {err}")))?
    }

    /// [`Self::encode`] on the blocking pool for sealed payloads.
    pub async fn encode_offloaded(&self, key: &VaultKey, blob: &VaultBlob) -> VaultResult<String> {
        if matches!(self, Self::Work) {
            return self.encode(key, blob);
        }
        let access = self.clone();
        let key = key.clone();
        let blob = blob.clone();
        tokio::task::spawn_blocking(move || access.encode(&key, &blob))
            .await
            .map_err(|err| VaultError::Transport(format!("encode task failed: {err}")))?
    }
}
