//! Database layer: PostgreSQL repositories over `sqlx`.
//!
//! Repositories are cheap-to-clone structs over a shared [`sqlx::PgPool`].
//! The [`FileStore`] trait is the seam the API and worker depend on, so
//! both can be exercised with in-memory fakes in tests.

mod files;

pub use files::{FileRepository, FileStore};

use paperchat_core::AppError;
use sqlx::PgPool;

/// Run pending migrations. Called once at startup, before any repository
/// is handed out.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
    Ok(())
}
