use async_trait::async_trait;
use chrono::Utc;
use paperchat_core::models::{FileRecord, NewFileRecord, UploadStatus};
use paperchat_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence seam for file records.
///
/// Every read is scoped to an owner unless the method says otherwise;
/// `get_unchecked` exists only for the ingestion worker, which receives the
/// id from a record it just created and has no user in scope.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert a new record. The caller supplies the status (intake always
    /// passes `Processing`; regeneration passes `Success`).
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Lookup by storage key, across owners. Upload intake uses this for
    /// idempotency: upload-service keys are globally unique.
    async fn find_by_key(&self, key: &str) -> Result<Option<FileRecord>, AppError>;

    /// Owner-scoped lookup by id.
    async fn find_for_user(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<FileRecord>, AppError>;

    /// All records owned by the user, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError>;

    /// Unscoped lookup by id, for the ingestion worker.
    async fn get_unchecked(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Transition a record out of `Processing`. Returns `false` when the row
    /// was already terminal (or missing), in which case nothing was written —
    /// this is the guard that keeps status transitions monotonic even if an
    /// ingestion run is accidentally doubled.
    async fn transition_status(&self, id: Uuid, to: UploadStatus) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "files", db.operation = "insert", file.key = %new.key))]
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError> {
        let now = Utc::now();

        let record = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            INSERT INTO files (id, user_id, key, name, url, upload_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.user_id)
        .bind(&new.key)
        .bind(&new.name)
        .bind(&new.url)
        .bind(new.upload_status.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn find_by_key(&self, key: &str) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>("SELECT * FROM files WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn find_for_user(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(
            "SELECT * FROM files WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, FileRecord>(
            "SELECT * FROM files WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get_unchecked(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id, file.status = %to))]
    async fn transition_status(&self, id: Uuid, to: UploadStatus) -> Result<bool, AppError> {
        // The WHERE clause only matches rows still in PROCESSING, so a
        // transition against a terminal row is a no-op reporting zero rows.
        let result = sqlx::query(
            r#"
            UPDATE files
            SET upload_status = $2, updated_at = $3
            WHERE id = $1 AND upload_status = $4
            "#,
        )
        .bind(id)
        .bind(to.to_string())
        .bind(Utc::now())
        .bind(UploadStatus::Processing.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
