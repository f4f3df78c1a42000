use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use paperchat_core::models::{FileResponse, NewFileRecord, UploadStatus};
use paperchat_worker::IngestJob;
use serde::Deserialize;
use std::sync::Arc;

/// Completed-upload callback from the upload service.
#[derive(Debug, Deserialize)]
pub struct UploadCompleteRequest {
    pub key: String,
    pub name: String,
    pub url: String,
}

/// Record a completed upload and kick off ingestion.
///
/// Idempotent on the storage key: a replayed callback returns the existing
/// record without writing anything or re-triggering ingestion. Ingestion is
/// fire-and-forget; the caller never observes its outcome here.
pub async fn upload_complete(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Json(body): Json<UploadCompleteRequest>,
) -> Result<Json<FileResponse>, HttpAppError> {
    if let Some(existing) = state.files.find_by_key(&body.key).await? {
        tracing::debug!(key = %body.key, "Upload already recorded, skipping");
        return Ok(Json(existing.into()));
    }

    let record = state
        .files
        .create(NewFileRecord {
            user_id: user.user_id,
            key: body.key,
            name: body.name,
            url: body.url,
            upload_status: UploadStatus::Processing,
        })
        .await?;

    tracing::info!(file_id = %record.id, key = %record.key, "File record created");

    // A full queue leaves the record in PROCESSING; the callback itself
    // still succeeds.
    if let Err(e) = state.ingest.submit(IngestJob::ProcessFile {
        file_id: record.id,
    }) {
        tracing::error!(file_id = %record.id, error = %e, "Failed to enqueue ingest job");
    }

    Ok(Json(record.into()))
}
