//! Blob storage for raw PDF bytes
//!
//! Blobs are addressed by a generated name (UUIDv4 plus the original
//! extension). Two backends are provided:
//! - `LocalBlobStore`: files under an upload root on local disk
//! - `S3BlobStore`: an S3 bucket (AWS, MinIO or LocalStack)
//!
//! The store is constructed once at startup and injected into handlers.

mod local;
mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::AppError;
use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Streaming reader over a stored blob
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::File {
            message: "File storage operation failed".to_string(),
            details: err.to_string(),
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    async fn open(&self, name: &str) -> Result<BlobReader, StorageError>;

    /// `Ok(false)` only when the blob is definitely absent
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Deleting a missing blob is not an error
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Build the configured blob store
pub async fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalBlobStore::new(&config.upload_dir).await?)),
        StorageBackend::S3 => Ok(Arc::new(S3BlobStore::new(config).await?)),
    }
}

/// Unique storage name keeping the original file's extension
pub fn generate_blob_name(original: &str) -> String {
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Blob names are single path components
pub(crate) fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
