//! Local filesystem storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;

use super::backend::{StorageBackend, StorageError, StorageResult};

/// Blobs under `{base_path}/{namespace}/{key}`.
///
/// Writes go to a `.tmp` sibling first and are renamed into place, so a
/// reader never sees a half-written image.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn key_path(&self, namespace: &str, key: &str) -> StorageResult<PathBuf> {
        if !is_safe_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(namespace).join(key))
    }
}

/// Keys must stay inside their namespace directory.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(namespace, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", namespace, key)))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, namespace: &str, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        let path = self.key_path(namespace, key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let tmp = path.with_file_name(format!(".{}.tmp", key));
        fs::write(&tmp, &data).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }
}
