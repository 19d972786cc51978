//! Storage backend abstraction for uploaded note files and site images.
//!
//! Supports multiple backends:
//! - `local`: Local filesystem storage served under the media URL
//! - `s3`: S3-compatible object storage (MinIO, AWS S3, etc.)
//!
//! Keys are relative, slash separated paths such as
//! `notes/ENG/BCS/2024/Year_1/semester_1/intro.pdf`.

pub mod local;
pub mod s3;

use crate::app_config::StorageConfig;
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed stream of bytes for streaming file content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Represents a retrieved storage object with metadata.
pub struct StorageObject {
    /// Streaming body content
    pub body: ByteStream,
    /// Content length in bytes
    pub content_length: Option<i64>,
    /// MIME content type
    pub content_type: Option<String>,
}

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// File not found
    NotFound(String),
    /// Key escapes the storage root or is empty
    InvalidKey(String),
    /// I/O error
    Io(std::io::Error),
    /// S3 error
    S3(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: {}", key),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::S3(msg) => write!(f, "S3 error: {}", msg),
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

/// Trait for storage backends.
///
/// All storage backends must implement this trait to provide
/// a unified interface for file storage operations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`, replacing any previous content.
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError>;

    /// Retrieve a file.
    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError>;

    /// Remove a file. Removing a missing file is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL of a stored file. May be host relative.
    fn url(&self, key: &str) -> String;
}

/// Build the backend selected by the storage configuration.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend.as_str() {
        "s3" => {
            let region = rusoto_core::Region::Custom {
                name: config.s3_region.clone(),
                endpoint: config.s3_endpoint.clone(),
            };
            Ok(Arc::new(s3::S3Storage::new(
                region,
                config.s3_bucket.clone(),
                config.s3_public_url.clone(),
            )))
        }
        "local" => Ok(Arc::new(local::LocalStorage::new(
            PathBuf::from(&config.local_path),
            config.media_url.clone(),
        )?)),
        other => Err(StorageError::InvalidKey(format!(
            "unknown storage backend \"{}\"",
            other
        ))),
    }
}

/// Reject empty keys, absolute keys and keys with `.` or `..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad_segment = key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if key.is_empty() || key.contains('\\') || bad_segment {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Get MIME type from filename extension.
pub fn mime_type_for(key: &str) -> String {
    let ext = key.rsplit('.').next().unwrap_or_default();
    let mime = match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    };
    mime.to_string()
}
