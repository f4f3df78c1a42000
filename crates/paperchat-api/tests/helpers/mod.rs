//! Test harness: a full router over in-memory collaborators, so handler
//! behavior (status codes, scoping, idempotency) is exercised without
//! Postgres or any external service.

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use paperchat_api::auth::JwtClaims;
use paperchat_api::setup::routes::setup_routes;
use paperchat_api::state::AppState;
use paperchat_core::models::{FileRecord, NewFileRecord, UploadStatus};
use paperchat_core::{AppError, GenerationStrategy, StorageBackend};
use paperchat_db::FileStore;
use paperchat_services::CompletionProvider;
use paperchat_storage::{Storage, StorageError, StorageResult};
use paperchat_worker::IngestQueue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct InMemoryFileStore {
    records: Mutex<HashMap<Uuid, FileRecord>>,
}

impl InMemoryFileStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<FileRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn insert(&self, user_id: &str, key: &str, status: UploadStatus) -> Uuid {
        let id = Uuid::new_v4();
        let record = FileRecord {
            id,
            user_id: user_id.to_string(),
            key: key.to_string(),
            name: key.to_string(),
            url: format!("http://files.test/{}", key),
            upload_status: status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.records.lock().unwrap().insert(id, record);
        id
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError> {
        let record = FileRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            key: new.key,
            name: new.name,
            url: new.url,
            upload_status: new.upload_status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.key == key)
            .cloned())
    }

    async fn find_for_user(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let mut files: Vec<FileRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn get_unchecked(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn transition_status(&self, id: Uuid, to: UploadStatus) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if record.upload_status == UploadStatus::Processing => {
                record.upload_status = to;
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = paperchat_storage::keys::upload_key(user_id, filename);
        let url = self.upload_with_key(&key, data, content_type).await?;
        Ok((key, url))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(format!("http://files.test/{}", storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct StaticCompletion(pub &'static str);

#[async_trait]
impl CompletionProvider for StaticCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

pub struct TestApp {
    pub router: Router,
    pub files: Arc<InMemoryFileStore>,
    pub storage: Arc<MemoryStorage>,
}

pub fn setup_test_app(strategy: GenerationStrategy) -> TestApp {
    let files = Arc::new(InMemoryFileStore::default());
    let storage = Arc::new(MemoryStorage::default());

    let completion: Option<Arc<dyn CompletionProvider>> = match strategy {
        GenerationStrategy::Llm => Some(Arc::new(StaticCompletion("Synthesized document body"))),
        GenerationStrategy::Direct => None,
    };

    let state = Arc::new(AppState {
        files: files.clone(),
        storage: storage.clone(),
        completion,
        ingest: IngestQueue::noop(),
        generation: strategy,
    });

    TestApp {
        router: setup_routes(TEST_JWT_SECRET, state),
        files,
        storage,
    }
}

/// Mint a bearer token the auth middleware accepts.
pub fn bearer_token(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
