//! Storage abstraction trait
//!
//! All storage backends (S3, local filesystem) implement [`Storage`].
//! The worker and API hold an `Arc<dyn Storage>` and never see backend
//! details.

use async_trait::async_trait;
use paperchat_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file under a freshly generated key and return
    /// `(storage_key, storage_url)`. The key is the internal identifier;
    /// the URL is publicly reachable.
    async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Upload data to a specific storage key (the ingestion workflow re-uploads
    /// the original bytes under the record's existing key). Returns the public URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Download a file by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type.
    fn backend_type(&self) -> StorageBackend;
}
