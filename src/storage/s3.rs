//! S3-compatible blob storage (AWS S3, MinIO, R2).
//!
//! Images are written with their content type so a public bucket can serve
//! them straight to browsers.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{primitives::ByteStream, Client};
use bytes::Bytes;

use super::backend::{StorageBackend, StorageError, StorageResult};

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    /// Prepended verbatim to every object key (e.g. "prod/")
    pub prefix: Option<String>,
    pub region: String,
    /// Custom endpoint for S3-compatible services
    pub endpoint: Option<String>,
    /// Path-style addressing, required by MinIO
    pub force_path_style: bool,
}

impl S3Config {
    pub fn aws(bucket: String, region: String) -> Self {
        Self {
            bucket,
            prefix: None,
            region,
            endpoint: None,
            force_path_style: false,
        }
    }

    /// MinIO or another S3-compatible service at `endpoint`.
    pub fn minio(bucket: String, endpoint: String) -> Self {
        Self {
            bucket,
            prefix: None,
            region: "us-east-1".to_string(),
            endpoint: Some(endpoint),
            force_path_style: true,
        }
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefix = Some(prefix);
        self
    }

    fn object_key(&self, namespace: &str, key: &str) -> String {
        format!("{}{}/{}", self.prefix.as_deref().unwrap_or(""), namespace, key)
    }
}

pub struct S3Storage {
    client: Client,
    config: S3Config,
}

impl S3Storage {
    /// Credentials come from the usual AWS provider chain (env, profile, IMDS).
    pub async fn new(config: S3Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(
            "Using S3 bucket {} ({})",
            config.bucket,
            config.endpoint.as_deref().unwrap_or("aws")
        );

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Bytes> {
        let object_key = self.config.object_key(namespace, key);

        let output = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(StorageError::NotFound(format!("{}/{}", namespace, key)));
            }
            Err(e) => return Err(StorageError::Other(format!("get {}: {}", object_key, e))),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Other(format!("read {}: {}", object_key, e)))?;
        Ok(body.into_bytes())
    }

    async fn put(&self, namespace: &str, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let object_key = self.config.object_key(namespace, key);

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Other(format!("put {}: {}", object_key, e)))?;

        Ok(())
    }
}
