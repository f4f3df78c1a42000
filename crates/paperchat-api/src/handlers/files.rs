use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use paperchat_core::models::FileResponse;
use paperchat_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// List the caller's files, newest first. Clients poll this (or
/// [`get_file`]) to observe ingestion outcomes.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: UserContext,
) -> Result<Json<Vec<FileResponse>>, HttpAppError> {
    let files = state.files.list_for_user(&user.user_id).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// Owner-scoped single-record fetch.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(file_id): Path<Uuid>,
) -> Result<Json<FileResponse>, HttpAppError> {
    let file = state
        .files
        .find_for_user(&user.user_id, file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(file.into()))
}
