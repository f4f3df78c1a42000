use async_trait::async_trait;
use paperchat_core::AppError;
use serde::{Deserialize, Serialize};

/// One vector ready for indexing: stable id, embedding values, and the
/// metadata the retrieval side reads back (page text, page number).
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: serde_json::Value,
}

/// A namespaced vector index. Namespacing by file-record id keeps one
/// document's vectors isolated from every other document sharing the index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, namespace: &str, vectors: Vec<VectorRecord>) -> Result<(), AppError>;
}

/// Pinecone-style REST index client. `host` is the per-index data-plane
/// endpoint reported by the control plane.
#[derive(Clone)]
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    pub fn new(client: reqwest::Client, host: &str, api_key: &str) -> Self {
        Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: u64,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    #[tracing::instrument(skip(self, vectors), fields(namespace = %namespace, vector_count = vectors.len()))]
    async fn upsert(&self, namespace: &str, vectors: Vec<VectorRecord>) -> Result<(), AppError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .json(&UpsertRequest {
                vectors: &vectors,
                namespace,
            })
            .send()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorIndex(format!(
                "Upsert returned {}: {}",
                status, body
            )));
        }

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Invalid response body: {}", e)))?;

        tracing::debug!(
            namespace = %namespace,
            upserted = parsed.upserted_count,
            "Vector upsert complete"
        );

        Ok(())
    }
}
