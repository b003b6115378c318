//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage::{S3Config, StorageConfig};

/// Default page size when the client does not send `limit`
pub const DEFAULT_PAGE_LIMIT: u64 = 5;

/// Largest page size served unless overridden
pub const DEFAULT_MAX_PAGE_LIMIT: u64 = 100;

/// Upload body limit (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the SQLite database (and local blobs)
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Base URL under which uploaded images are reachable
    pub image_base_url: String,
    pub max_page_limit: u64,
    pub max_upload_bytes: usize,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Build the configuration from `SUPERHERO_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("SUPERHERO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("superhero-data"));

        let bind_addr = parse_or(
            &lookup,
            "SUPERHERO_BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3000)),
        );

        let public_url = lookup("SUPERHERO_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{}", bind_addr));
        let image_base_url = lookup("SUPERHERO_IMAGE_BASE_URL")
            .unwrap_or_else(|| format!("{}/images", public_url.trim_end_matches('/')));

        let max_page_limit = parse_or(&lookup, "SUPERHERO_MAX_PAGE_LIMIT", DEFAULT_MAX_PAGE_LIMIT).max(1);
        let max_upload_bytes = parse_or(&lookup, "SUPERHERO_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        let storage = match lookup("SUPERHERO_S3_BUCKET") {
            Some(bucket) => {
                let mut s3 = match lookup("SUPERHERO_S3_ENDPOINT") {
                    Some(endpoint) => S3Config::minio(bucket, endpoint),
                    None => S3Config::aws(bucket, "us-east-1".to_string()),
                };
                if let Some(region) = lookup("SUPERHERO_S3_REGION") {
                    s3.region = region;
                }
                if let Some(prefix) = lookup("SUPERHERO_S3_PREFIX") {
                    s3 = s3.with_prefix(prefix);
                }
                StorageConfig::s3(s3)
            }
            None => StorageConfig::local(data_dir.join("blobs")),
        };

        Self {
            data_dir,
            bind_addr,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            max_page_limit,
            max_upload_bytes,
            storage,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("superheroes.db")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}
