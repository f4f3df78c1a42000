use paperchat_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connect the pool and bring the schema up to date.
pub async fn connect(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await?;

    paperchat_db::run_migrations(&pool).await?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database pool ready"
    );

    Ok(pool)
}
