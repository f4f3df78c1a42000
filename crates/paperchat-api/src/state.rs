//! Application state shared by all handlers.

use paperchat_core::GenerationStrategy;
use paperchat_db::FileStore;
use paperchat_services::CompletionProvider;
use paperchat_storage::Storage;
use paperchat_worker::IngestQueue;
use std::sync::Arc;

/// Everything a handler can reach. The worker-side collaborators
/// (embeddings, vector index, subscriptions) live inside the ingest
/// queue's pipeline and are not exposed here.
#[derive(Clone)]
pub struct AppState {
    pub files: Arc<dyn FileStore>,
    pub storage: Arc<dyn Storage>,
    /// Present only when the deployment uses the LLM regeneration strategy.
    pub completion: Option<Arc<dyn CompletionProvider>>,
    pub ingest: IngestQueue,
    pub generation: GenerationStrategy,
}
