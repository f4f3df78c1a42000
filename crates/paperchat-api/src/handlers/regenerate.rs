use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use paperchat_core::models::{FileRecord, NewFileRecord, UploadStatus};
use paperchat_core::{AppError, GenerationStrategy};
use paperchat_services::{pdf, regeneration_prompt};
use paperchat_storage::keys;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub text: String,
    /// Optional supplementary URL woven into the LLM prompt.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub generated_id: Uuid,
    pub url: String,
}

/// Produce a new document from user-submitted text, scoped to an existing
/// file the caller owns. The generation strategy is fixed per deployment;
/// both paths persist the result to durable storage and create a new
/// `SUCCESS` record (generated documents are not re-ingested).
pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(file_id): Path<Uuid>,
    Json(body): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, HttpAppError> {
    let file = state
        .files
        .find_for_user(&user.user_id, file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let generated = match state.generation {
        GenerationStrategy::Direct => {
            generate_direct(&state, &user.user_id, &body.text).await?
        }
        GenerationStrategy::Llm => {
            generate_from_completion(&state, &user.user_id, &file, &body).await?
        }
    };

    tracing::info!(
        file_id = %file_id,
        generated_id = %generated.id,
        "Generated document created"
    );

    Ok(Json(RegenerateResponse {
        generated_id: generated.id,
        url: generated.url,
    }))
}

/// Direct construction: a PDF containing the literal text, left-aligned.
async fn generate_direct(
    state: &AppState,
    user_id: &str,
    text: &str,
) -> Result<FileRecord, HttpAppError> {
    let text = text.to_string();
    let bytes = tokio::task::spawn_blocking(move || pdf::build_pdf(&text))
        .await
        .map_err(|e| AppError::Internal(format!("PDF build task panicked: {}", e)))??;

    let name = format!("{}.pdf", Uuid::new_v4());
    let key = keys::generated_key(&name);
    let url = state
        .storage
        .upload_with_key(&key, bytes, "application/pdf")
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let record = state
        .files
        .create(NewFileRecord {
            user_id: user_id.to_string(),
            key,
            name,
            url,
            upload_status: UploadStatus::Success,
        })
        .await?;

    Ok(record)
}

/// LLM synthesis: prompt the completion provider with the original
/// document's URL plus the submitted text, persist the raw completion.
async fn generate_from_completion(
    state: &AppState,
    user_id: &str,
    file: &FileRecord,
    body: &RegenerateRequest,
) -> Result<FileRecord, HttpAppError> {
    let completion = state.completion.as_ref().ok_or_else(|| {
        AppError::Internal("Completion provider not configured".to_string())
    })?;

    let prompt = regeneration_prompt(&file.url, &body.text, body.url.as_deref());
    let content = completion.complete(&prompt).await?;

    let name = format!("{}.txt", Uuid::new_v4());
    let key = keys::generated_key(&name);
    let url = state
        .storage
        .upload_with_key(&key, content.into_bytes(), "text/plain; charset=utf-8")
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let record = state
        .files
        .create(NewFileRecord {
            user_id: user_id.to_string(),
            key,
            name,
            url,
            upload_status: UploadStatus::Success,
        })
        .await?;

    Ok(record)
}
