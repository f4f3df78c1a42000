//! Route configuration and setup

use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes.
///
/// `/health` is public; everything under `/api/v0` goes through the bearer
/// auth middleware.
pub fn setup_routes(jwt_secret: &str, state: Arc<AppState>) -> Router {
    let auth_state = Arc::new(AuthState {
        jwt_secret: jwt_secret.to_string(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/v0/uploads/complete", post(handlers::upload_complete))
        .route("/api/v0/files", get(handlers::list_files))
        .route("/api/v0/files/{file_id}", get(handlers::get_file))
        .route(
            "/api/v0/files/{file_id}/regenerate",
            post(handlers::regenerate),
        )
        .route(
            "/api/v0/files/{file_id}/generated/{generated_id}",
            get(handlers::generated_view),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
