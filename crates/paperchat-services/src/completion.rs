use async_trait::async_trait;
use paperchat_core::AppError;
use serde::{Deserialize, Serialize};

/// Text completion provider, used by the LLM regeneration strategy.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// Build the regeneration prompt from the original document's URL, the
/// user-submitted text, and an optional supplementary URL.
pub fn regeneration_prompt(
    original_url: &str,
    text: &str,
    supplementary_url: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Based on the original PDF at the following URL: {},\n\
         and the following additional text: {},\n\
         generate a new PDF document.",
        original_url, text
    );
    if let Some(url) = supplementary_url {
        prompt.push_str(&format!(
            " If there is a supplementary URL provided: {},\n\
             incorporate relevant content from there as well.",
            url
        ));
    }
    prompt
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompletion {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| AppError::Completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Completion(format!(
                "Completion endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Completion(format!("Invalid response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Completion("Response contained no choices".to_string()))
    }
}
