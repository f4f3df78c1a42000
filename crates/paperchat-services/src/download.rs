use async_trait::async_trait;
use bytes::Bytes;
use paperchat_core::AppError;

/// Fetch raw bytes from a URL. The ingestion workflow uses this to pull the
/// uploaded file back from the upload service before processing it.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError>;
}

/// HTTP implementation over a shared reqwest client. Redirects are followed;
/// any non-success status is a hard failure.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Download(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Download(format!(
                "Failed to download file. Status: {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Download(format!("Failed to read body: {}", e)))?;

        tracing::debug!(url = %url, size_bytes = bytes.len(), "File downloaded");

        Ok(bytes)
    }
}
