use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lockbox_core::{SecretStore, StoreError, StoreResult, StoredSecret, VaultKey, VersionToken};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const SECRET_EXT: &str = "secret";
const TAGS_EXT: &str = "tags.json";

/// [`SecretStore`] over a local directory, one file per identifier.
#[derive(Debug)]
pub struct FileSecretStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &VaultKey, ext: &str) -> PathBuf {
        let name = urlencoding::encode(key.as_str());
        self.root.join(format!("{name}.{ext}"))
    }

    async fn read_current(&self, path: &Path) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(path, &err)),
        }
    }

    async fn replace(&self, path: &Path, contents: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| io_error(&self.root, &err))?;
        let tmp = self.root.join(format!(".{}.tmp", Uuid::now_v7()));
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|err| io_error(&tmp, &err))?;
        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(path, &err));
        }
        Ok(())
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StoreError {
    let message = format!("{}: {err}", path.display());
    match err.kind() {
        ErrorKind::PermissionDenied => StoreError::access_denied(message),
        ErrorKind::NotFound => StoreError::not_found(message),
        _ => StoreError::other(message),
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn read(&self, key: &VaultKey) -> StoreResult<Option<StoredSecret>> {
        let path = self.path_for(key, SECRET_EXT);
        Ok(self.read_current(&path).await?.map(|contents| StoredSecret {
            version: VersionToken::of(&contents),
            data: Some(contents),
        }))
    }

    async fn write(
        &self,
        key: &VaultKey,
        payload: &str,
        expected: Option<&VersionToken>,
    ) -> StoreResult<VersionToken> {
        let path = self.path_for(key, SECRET_EXT);
        let _guard = self.write_lock.lock().await;
        if let Some(expected) = expected {
            let current = self.read_current(&path).await?;
            if current.as_deref().map(VersionToken::of).as_ref() != Some(expected) {
                return Err(StoreError::conflict(format!("{key} changed since it was read")));
            }
        }
        self.replace(&path, payload).await?;
        debug!(event = "file_secret_written", path = %path.display());
        Ok(VersionToken::of(payload))
    }

    async fn create(
        &self,
        key: &VaultKey,
        payload: &str,
        tags: &[(String, String)],
    ) -> StoreResult<VersionToken> {
        let path = self.path_for(key, SECRET_EXT);
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|err| io_error(&path, &err))?
        {
            return Err(StoreError::already_exists(format!("{key} already exists")));
        }
        if !tags.is_empty() {
            let tags_path = self.path_for(key, TAGS_EXT);
            let encoded = serde_json::to_string(tags)
                .map_err(|err| StoreError::other(format!("encode tags: {err}")))?;
            self.replace(&tags_path, &encoded).await?;
        }
        self.replace(&path, payload).await?;
        debug!(event = "file_secret_created", path = %path.display());
        Ok(VersionToken::of(payload))
    }
}
