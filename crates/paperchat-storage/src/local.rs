use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use paperchat_core::StorageBackend;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance.
    ///
    /// `base_path` is the root directory for file storage; `base_url` is the
    /// base URL the files are served under (e.g. "http://localhost:3000/files").
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert storage key to a filesystem path, rejecting traversal
    /// sequences that could escape the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = keys::upload_key(user_id, filename);
        let url = self.upload_with_key(&key, data, content_type).await?;
        Ok((key, url))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        file.write_all(&data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!(
            key = %storage_key,
            size_bytes = data.len(),
            "Local upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/files".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_upload_download_round_trip() {
        let (_dir, storage) = test_storage().await;

        let (key, url) = storage
            .upload("user_1", "doc.pdf", "application/pdf", b"%PDF-1.5 data".to_vec())
            .await
            .unwrap();

        assert_eq!(key, "uploads/user_1/doc.pdf");
        assert_eq!(url, "http://localhost:3000/files/uploads/user_1/doc.pdf");

        let data = storage.download(&key).await.unwrap();
        assert_eq!(data, b"%PDF-1.5 data");
    }

    #[tokio::test]
    async fn test_upload_with_key_overwrites() {
        let (_dir, storage) = test_storage().await;

        storage
            .upload_with_key("generated/out.pdf", b"one".to_vec(), "application/pdf")
            .await
            .unwrap();
        storage
            .upload_with_key("generated/out.pdf", b"two".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(storage.download("generated/out.pdf").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let (_dir, storage) = test_storage().await;

        match storage.download("uploads/u/missing.pdf").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn test_traversal_key_rejected() {
        let (_dir, storage) = test_storage().await;

        let result = storage.download("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_exists() {
        let (_dir, storage) = test_storage().await;

        assert!(!storage.exists("generated/x.pdf").await.unwrap());
        storage
            .upload_with_key("generated/x.pdf", b"x".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert!(storage.exists("generated/x.pdf").await.unwrap());
    }
}
