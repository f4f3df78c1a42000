use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Processing state of an uploaded or generated document.
///
/// Transitions are monotonic for a given ingestion attempt:
/// `Processing -> Success` or `Processing -> Failed`, never reversed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    Processing,
    Success,
    Failed,
}

impl UploadStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Failed)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Processing => write!(f, "PROCESSING"),
            UploadStatus::Success => write!(f, "SUCCESS"),
            UploadStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(UploadStatus::Processing),
            "SUCCESS" => Ok(UploadStatus::Success),
            "FAILED" => Ok(UploadStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// One uploaded or generated document and its processing status.
///
/// The record id doubles as the vector-index namespace for the document's
/// embedded pages. Every lookup is scoped to `user_id`; a record is never
/// visible to anyone but its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: String,
    pub key: String,
    pub name: String,
    pub url: String,
    pub upload_status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for FileRecord {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(FileRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            key: row.get("key"),
            name: row.get("name"),
            url: row.get("url"),
            upload_status: row.get::<String, _>("upload_status").parse().map_err(
                |e: anyhow::Error| {
                    sqlx::Error::Decode(format!("Failed to parse upload_status: {}", e).into())
                },
            )?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Fields for inserting a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub user_id: String,
    pub key: String,
    pub name: String,
    pub url: String,
    pub upload_status: UploadStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub upload_status: UploadStatus,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        FileResponse {
            id: file.id,
            name: file.name,
            url: file.url,
            upload_status: file.upload_status,
            created_at: file.created_at,
        }
    }
}
