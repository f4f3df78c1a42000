//! Process wiring: database, services, ingest queue, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use axum::Router;
use paperchat_core::models::PlanCatalog;
use paperchat_core::Config;
use paperchat_db::{FileRepository, FileStore};
use paperchat_worker::{IngestContext, IngestPipeline, IngestQueue};
use std::sync::Arc;

/// Build the full application: connect the database, run migrations,
/// construct service clients, start the ingest worker pool, and assemble
/// the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = database::connect(&config).await?;
    let files: Arc<dyn FileStore> = Arc::new(FileRepository::new(pool));

    let services = services::build_services(&config).await?;

    let plans = PlanCatalog::new(
        config.free_pages_per_pdf(),
        config.free_max_file_size_bytes(),
        config.pro_pages_per_pdf(),
        config.pro_max_file_size_bytes(),
    );

    let pipeline = Arc::new(IngestPipeline::new(IngestContext {
        files: files.clone(),
        storage: services.storage.clone(),
        fetcher: services.fetcher,
        embeddings: services.embeddings,
        vector_index: services.vector_index,
        subscriptions: services.subscriptions,
        plans,
    }));
    let ingest = IngestQueue::new(pipeline, config.ingest_max_concurrent());

    let state = Arc::new(AppState {
        files,
        storage: services.storage,
        completion: services.completion,
        ingest,
        generation: config.generation_strategy(),
    });

    let router = routes::setup_routes(config.jwt_secret(), state.clone());

    Ok((state, router))
}
