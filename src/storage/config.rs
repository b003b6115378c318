//! Which blob store the server writes uploads to.

use std::path::PathBuf;
use std::sync::Arc;

use super::{LocalStorage, S3Config, S3Storage, StorageBackend};

#[derive(Debug, Clone)]
pub enum StorageType {
    /// Directory on the local filesystem
    Local { path: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub storage_type: StorageType,
}

impl StorageConfig {
    pub fn local(path: PathBuf) -> Self {
        Self {
            storage_type: StorageType::Local { path },
        }
    }

    pub fn s3(config: S3Config) -> Self {
        Self {
            storage_type: StorageType::S3(config),
        }
    }

    /// Build the backend this config describes.
    pub async fn build(&self) -> Arc<dyn StorageBackend> {
        match &self.storage_type {
            StorageType::Local { path } => {
                if let Err(e) = tokio::fs::create_dir_all(path).await {
                    tracing::warn!("Could not create storage directory {:?}: {}", path, e);
                }
                tracing::info!("Storing uploads under {:?}", path);
                Arc::new(LocalStorage::new(path.clone()))
            }
            StorageType::S3(config) => Arc::new(S3Storage::new(config.clone()).await),
        }
    }
}
