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

#[derive(Debug, serde::Serialize)]
pub struct GeneratedPairResponse {
    pub original: FileResponse,
    pub generated: FileResponse,
}

/// Load an original/generated pair for side-by-side rendering. Both lookups
/// are owner-scoped; a missing record on either side is a 404.
pub async fn generated_view(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path((file_id, generated_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GeneratedPairResponse>, HttpAppError> {
    let original = state.files.find_for_user(&user.user_id, file_id).await?;
    let generated = state
        .files
        .find_for_user(&user.user_id, generated_id)
        .await?;

    match (original, generated) {
        (Some(original), Some(generated)) => Ok(Json(GeneratedPairResponse {
            original: original.into(),
            generated: generated.into(),
        })),
        _ => Err(AppError::NotFound("File not found".to_string()).into()),
    }
}
