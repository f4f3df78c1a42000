use paperchat_core::{Config, GenerationStrategy};
use paperchat_services::{
    CompletionProvider, EmbeddingProvider, FileFetcher, FreeTierSubscriptions, HttpFetcher,
    HttpSubscriptionService, OpenAiCompletion, OpenAiEmbeddings, PineconeIndex,
    SubscriptionService, VectorIndex,
};
use paperchat_storage::{create_storage, Storage};
use std::sync::Arc;

/// External collaborators, constructed once at startup.
pub struct Services {
    pub storage: Arc<dyn Storage>,
    pub fetcher: Arc<dyn FileFetcher>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub completion: Option<Arc<dyn CompletionProvider>>,
    pub subscriptions: Arc<dyn SubscriptionService>,
}

pub async fn build_services(config: &Config) -> Result<Services, anyhow::Error> {
    let client = reqwest::Client::new();

    let storage = create_storage(config).await?;

    let embeddings_key = config
        .embeddings_api_key()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set for embeddings"))?;
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddings::new(
        client.clone(),
        config.embeddings_endpoint(),
        embeddings_key,
        config.embeddings_model(),
    ));

    let index_host = config
        .vector_index_endpoint()
        .ok_or_else(|| anyhow::anyhow!("VECTOR_INDEX_ENDPOINT must be set"))?;
    let index_key = config
        .vector_index_api_key()
        .ok_or_else(|| anyhow::anyhow!("VECTOR_INDEX_API_KEY must be set"))?;
    let vector_index: Arc<dyn VectorIndex> =
        Arc::new(PineconeIndex::new(client.clone(), index_host, index_key));

    // The completion provider only exists in LLM-strategy deployments.
    let completion: Option<Arc<dyn CompletionProvider>> = match config.generation_strategy() {
        GenerationStrategy::Llm => {
            let llm_key = config
                .llm_api_key()
                .ok_or_else(|| anyhow::anyhow!("LLM_API_KEY must be set for the llm strategy"))?;
            Some(Arc::new(OpenAiCompletion::new(
                client.clone(),
                config.llm_endpoint(),
                llm_key,
                config.llm_model(),
                config.llm_max_tokens(),
            )))
        }
        GenerationStrategy::Direct => None,
    };

    let subscriptions: Arc<dyn SubscriptionService> = match config.billing_endpoint() {
        Some(endpoint) => Arc::new(HttpSubscriptionService::new(client.clone(), endpoint)),
        None => {
            tracing::warn!("BILLING_ENDPOINT not set, all users resolve to the free tier");
            Arc::new(FreeTierSubscriptions)
        }
    };

    Ok(Services {
        storage,
        fetcher: Arc::new(HttpFetcher::new(client)),
        embeddings,
        vector_index,
        completion,
        subscriptions,
    })
}
