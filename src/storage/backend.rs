//! Storage backend trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    /// Key contains characters outside `[A-Za-z0-9._-]` or starts with a dot
    InvalidKey(String),
    Io(std::io::Error),
    /// Backend-specific failure (S3 SDK errors)
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(key) => write!(f, "Object not found: {}", key),
            StorageError::InvalidKey(key) => write!(f, "Invalid key: {}", key),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend trait for pluggable blob storage.
///
/// Keys are organized by namespace so that different kinds of blobs can
/// live side by side in one bucket or directory.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch an object; `NotFound` when absent.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Bytes>;

    /// Store an object, replacing any previous one under the same key.
    ///
    /// `content_type` is recorded where the backend supports object metadata.
    async fn put(&self, namespace: &str, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;
}

/// Storage namespaces
pub mod namespaces {
    /// Uploaded superhero images
    pub const IMAGES: &str = "images";
}
