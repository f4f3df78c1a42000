use async_trait::async_trait;
use paperchat_core::AppError;
use serde::{Deserialize, Serialize};

/// Provider for text embeddings. One batched call per document; the result
/// is in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model name recorded alongside the vectors (e.g. "text-embedding-ada-002").
    fn model_name(&self) -> &str;

    /// Compute one embedding per input text, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}

/// OpenAI-compatible embeddings endpoint.
#[derive(Clone)]
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip(self, texts), fields(provider = "openai", batch_size = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Embeddings endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Invalid response body: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // The API may return entries out of order; index is authoritative.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}
