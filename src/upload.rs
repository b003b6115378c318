//! Image uploads: validate the payload, store it as a blob, hand back its public url.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::storage::{namespaces, StorageBackend};

/// A file received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// POST /upload response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

pub struct ImageUploader {
    storage: Arc<dyn StorageBackend>,
    base_url: String,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn StorageBackend>, base_url: impl Into<String>) -> Self {
        Self {
            storage,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn upload(&self, file: Option<UploadedFile>) -> Result<UploadResponse> {
        let file = file.ok_or_else(|| ServerError::UploadRejected("No file uploaded".to_string()))?;

        let declared = file
            .content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !declared.starts_with("image/") {
            return Err(ServerError::UploadRejected("Only image files are allowed".to_string()));
        }
        if file.data.is_empty() {
            return Err(ServerError::UploadRejected("Uploaded file is empty".to_string()));
        }

        let content_type = sniff_image_type(&file.data)
            .or_else(|| (declared == "image/svg+xml" && looks_like_svg(&file.data)).then_some("image/svg+xml"))
            .ok_or_else(|| {
                ServerError::UploadRejected("File content is not a recognised image".to_string())
            })?;

        let key = format!(
            "{}_{}",
            Uuid::now_v7().simple(),
            sanitize_file_name(file.file_name.as_deref().unwrap_or("image"))
        );

        self.storage
            .put(namespaces::IMAGES, &key, file.data.clone(), content_type)
            .await?;

        tracing::info!("Stored {} upload ({} bytes) as {}", content_type, file.data.len(), key);

        Ok(UploadResponse {
            url: format!("{}/{}", self.base_url, key),
        })
    }

    /// Read a stored image back, with the content type sniffed from its bytes.
    pub async fn fetch(&self, key: &str) -> Result<(&'static str, Bytes)> {
        let data = self.storage.get(namespaces::IMAGES, key).await?;
        let content_type = sniff_image_type(&data)
            .or_else(|| looks_like_svg(&data).then_some("image/svg+xml"))
            .unwrap_or("application/octet-stream");
        Ok((content_type, data))
    }
}

/// Identify a raster image format by its magic bytes.
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
        (b"II*\0", "image/tiff"),
        (b"MM\0*", "image/tiff"),
        (b"\0\0\x01\0", "image/x-icon"),
    ];

    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" && matches!(&data[8..12], b"avif" | b"avis") {
        return Some("image/avif");
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, mime)| *mime)
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}

/// Keep only characters that are safe in a storage key.
fn sanitize_file_name(name: &str) -> String {
    // Browsers may send a full client-side path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}
