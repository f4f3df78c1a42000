use paperchat_core::models::{exceeds_page_limit, FileRecord, PlanCatalog, UploadStatus};
use paperchat_core::AppError;
use paperchat_db::FileStore;
use paperchat_services::{
    pdf, EmbeddingProvider, FileFetcher, SubscriptionService, VectorIndex, VectorRecord,
};
use paperchat_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;

/// Collaborators the pipeline sequences. All trait objects so tests can
/// substitute in-memory fakes.
pub struct IngestContext {
    pub files: Arc<dyn FileStore>,
    pub storage: Arc<dyn Storage>,
    pub fetcher: Arc<dyn FileFetcher>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub subscriptions: Arc<dyn SubscriptionService>,
    pub plans: PlanCatalog,
}

enum IngestOutcome {
    Indexed { pages: usize },
    OverPlanLimit { pages: u32, limit: u32 },
}

/// The ingestion workflow: download, extract, plan check, re-upload,
/// embed, index, finalize. One run is the sole writer of its record;
/// the terminal-state guard in [`FileStore::transition_status`] makes a
/// doubled run a no-op.
pub struct IngestPipeline {
    ctx: IngestContext,
}

impl IngestPipeline {
    pub fn new(ctx: IngestContext) -> Self {
        Self { ctx }
    }

    /// Run the full workflow for one file record. Errors from any step are
    /// absorbed into a `FAILED` status transition and logged; the returned
    /// error exists only so the queue can log job outcomes.
    #[tracing::instrument(skip(self), fields(file.id = %file_id, job.status = tracing::field::Empty))]
    pub async fn run(&self, file_id: Uuid) -> anyhow::Result<()> {
        let start = std::time::Instant::now();
        tracing::info!(file_id = %file_id, "Starting ingestion");

        let file = self
            .ctx
            .files
            .get_unchecked(file_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("File record {} not found", file_id))?;

        if file.upload_status.is_terminal() {
            tracing::debug!(
                file_id = %file_id,
                status = %file.upload_status,
                "Record already terminal, skipping ingestion"
            );
            return Ok(());
        }

        let elapsed = |s: std::time::Instant| s.elapsed().as_millis();

        match self.process(&file).await {
            Ok(IngestOutcome::Indexed { pages }) => {
                tracing::Span::current().record("job.status", "success");
                if !self
                    .ctx
                    .files
                    .transition_status(file_id, UploadStatus::Success)
                    .await?
                {
                    tracing::debug!(
                        file_id = %file_id,
                        "Record reached a terminal state elsewhere, leaving it untouched"
                    );
                }
                tracing::info!(
                    file_id = %file_id,
                    pages = pages,
                    duration_ms = elapsed(start),
                    "Ingestion completed successfully"
                );
                Ok(())
            }
            Ok(IngestOutcome::OverPlanLimit { pages, limit }) => {
                tracing::Span::current().record("job.status", "plan_limit");
                self.mark_failed(file_id).await;
                tracing::warn!(
                    file_id = %file_id,
                    pages = pages,
                    limit = limit,
                    "Failed to ingest due to plan limitations"
                );
                Ok(())
            }
            Err(e) => {
                tracing::Span::current().record("job.status", "failed");
                tracing::error!(
                    file_id = %file_id,
                    step = e.error_type(),
                    error = %e,
                    duration_ms = elapsed(start),
                    "Ingestion failed"
                );
                self.mark_failed(file_id).await;
                Err(e.into())
            }
        }
    }

    /// Steps 1-5 of the workflow. Plan-limit violations are an expected
    /// outcome, not an error; everything else propagates for `run` to absorb.
    async fn process(&self, file: &FileRecord) -> Result<IngestOutcome, AppError> {
        // 1. Pull the uploaded bytes back from the upload service.
        let bytes = self.ctx.fetcher.fetch(&file.url).await?;

        // 2. Page-level text extraction, off the async runtime.
        let data = bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&data))
            .await
            .map_err(|e| AppError::Internal(format!("Extraction task panicked: {}", e)))??;
        let page_count = pages.len() as u32;
        tracing::debug!(file_id = %file.id, pages = page_count, "Extracted page-level text");

        // 3. Plan ceiling check. Over the limit means FAILED with no indexing.
        let subscription = self.ctx.subscriptions.plan_for_user(&file.user_id).await?;
        if let Some(limit) = exceeds_page_limit(&self.ctx.plans, &subscription, page_count)? {
            return Ok(IngestOutcome::OverPlanLimit {
                pages: page_count,
                limit,
            });
        }

        // 4. Re-upload the original bytes to the permanent location.
        self.ctx
            .storage
            .upload_with_key(&file.key, bytes.to_vec(), "application/pdf")
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        // 5. Embed every page in one batch and upsert into the record's own
        //    namespace, isolating this document's vectors.
        let texts: Vec<String> = pages.iter().map(|p| p.content.clone()).collect();
        let embeddings = self.ctx.embeddings.embed_documents(&texts).await?;
        if embeddings.len() != pages.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                pages.len(),
                embeddings.len()
            )));
        }

        let namespace = file.id.to_string();
        let vectors = pages
            .iter()
            .zip(embeddings)
            .map(|(page, values)| VectorRecord {
                id: format!("{}-{}", file.id, page.page_number),
                values,
                metadata: serde_json::json!({
                    "text": page.content,
                    "page": page.page_number,
                }),
            })
            .collect();
        self.ctx.vector_index.upsert(&namespace, vectors).await?;

        Ok(IngestOutcome::Indexed {
            pages: pages.len(),
        })
    }

    /// Best-effort FAILED transition. A failure here leaves the record in
    /// PROCESSING; there is no further recovery beyond the log line.
    async fn mark_failed(&self, file_id: Uuid) {
        match self
            .ctx
            .files
            .transition_status(file_id, UploadStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(file_id = %file_id, "Record already terminal, not marking failed");
            }
            Err(update_err) => {
                tracing::error!(
                    file_id = %file_id,
                    error = %update_err,
                    "Failed to update status to failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;
    use paperchat_core::models::{NewFileRecord, PlanTier, SubscriptionPlan};
    use paperchat_core::StorageBackend;
    use paperchat_storage::{StorageError, StorageResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryFileStore {
        records: Mutex<HashMap<Uuid, FileRecord>>,
    }

    impl InMemoryFileStore {
        fn insert_processing(&self, user_id: &str, key: &str, url: &str) -> Uuid {
            let id = Uuid::new_v4();
            let record = FileRecord {
                id,
                user_id: user_id.to_string(),
                key: key.to_string(),
                name: "doc.pdf".to_string(),
                url: url.to_string(),
                upload_status: UploadStatus::Processing,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.records.lock().unwrap().insert(id, record);
            id
        }

        fn status(&self, id: Uuid) -> UploadStatus {
            self.records.lock().unwrap().get(&id).unwrap().upload_status
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
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn get_unchecked(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
            Ok(self.records.lock().unwrap().get(&id).cloned())
        }

        async fn transition_status(
            &self,
            id: Uuid,
            to: UploadStatus,
        ) -> Result<bool, AppError> {
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

    struct StaticFetcher {
        data: Vec<u8>,
    }

    #[async_trait]
    impl FileFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Bytes, AppError> {
            Ok(Bytes::from(self.data.clone()))
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl FileFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Bytes, AppError> {
            Err(AppError::Download("Failed to download file. Status: 502".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingStorage {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Storage for RecordingStorage {
        async fn upload(
            &self,
            user_id: &str,
            filename: &str,
            content_type: &str,
            data: Vec<u8>,
        ) -> StorageResult<(String, String)> {
            let key = format!("uploads/{}/{}", user_id, filename);
            let url = self.upload_with_key(&key, data, content_type).await?;
            Ok((key, url))
        }

        async fn upload_with_key(
            &self,
            storage_key: &str,
            _data: Vec<u8>,
            _content_type: &str,
        ) -> StorageResult<String> {
            self.uploads.lock().unwrap().push(storage_key.to_string());
            Ok(format!("http://files.test/{}", storage_key))
        }

        async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
            Err(StorageError::NotFound(storage_key.to_string()))
        }

        async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    struct FixedEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddings {
        fn model_name(&self) -> &str {
            "test-embed"
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
            Ok(texts.iter().map(|_| vec![0.1; 8]).collect())
        }
    }

    struct FailingEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbeddings {
        fn model_name(&self) -> &str {
            "test-embed"
        }

        async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
            Err(AppError::Embedding("Embeddings endpoint returned 503".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserts: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn upsert(
            &self,
            namespace: &str,
            vectors: Vec<VectorRecord>,
        ) -> Result<(), AppError> {
            self.upserts
                .lock()
                .unwrap()
                .push((namespace.to_string(), vectors.len()));
            Ok(())
        }
    }

    struct StaticSubscriptions(SubscriptionPlan);

    #[async_trait]
    impl SubscriptionService for StaticSubscriptions {
        async fn plan_for_user(&self, _user_id: &str) -> Result<SubscriptionPlan, AppError> {
            Ok(self.0)
        }
    }

    struct Harness {
        files: Arc<InMemoryFileStore>,
        storage: Arc<RecordingStorage>,
        index: Arc<RecordingIndex>,
        pipeline: IngestPipeline,
    }

    fn harness(
        fetcher: Arc<dyn FileFetcher>,
        embeddings: Arc<dyn EmbeddingProvider>,
        subscription: SubscriptionPlan,
    ) -> Harness {
        let files = Arc::new(InMemoryFileStore::default());
        let storage = Arc::new(RecordingStorage::default());
        let index = Arc::new(RecordingIndex::default());
        let pipeline = IngestPipeline::new(IngestContext {
            files: files.clone(),
            storage: storage.clone(),
            fetcher,
            embeddings,
            vector_index: index.clone(),
            subscriptions: Arc::new(StaticSubscriptions(subscription)),
            plans: PlanCatalog::new(5, 4 * 1024 * 1024, 25, 16 * 1024 * 1024),
        });
        Harness {
            files,
            storage,
            index,
            pipeline,
        }
    }

    fn unsubscribed() -> SubscriptionPlan {
        SubscriptionPlan::free()
    }

    fn subscribed() -> SubscriptionPlan {
        SubscriptionPlan {
            tier: PlanTier::Pro,
            is_subscribed: true,
        }
    }

    /// Build a PDF with exactly `n` pages.
    fn pdf_with_pages(n: usize) -> Vec<u8> {
        let text = (0..pdf::LINES_PER_PAGE * n)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        pdf::build_pdf(&text).unwrap()
    }

    #[tokio::test]
    async fn test_three_pages_unsubscribed_ends_success() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: pdf_with_pages(3),
            }),
            Arc::new(FixedEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "abc.pdf", "http://up.test/abc.pdf");

        h.pipeline.run(id).await.unwrap();

        assert_eq!(h.files.status(id), UploadStatus::Success);
        // Exactly one namespaced upsert with one vector per page.
        let upserts = h.index.upserts.lock().unwrap();
        assert_eq!(upserts.as_slice(), &[(id.to_string(), 3)]);
        // The re-upload targeted the record's own key.
        assert_eq!(
            h.storage.uploads.lock().unwrap().as_slice(),
            &["abc.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_ten_pages_unsubscribed_ends_failed_without_indexing() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: pdf_with_pages(10),
            }),
            Arc::new(FixedEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "big.pdf", "http://up.test/big.pdf");

        h.pipeline.run(id).await.unwrap();

        assert_eq!(h.files.status(id), UploadStatus::Failed);
        // Over-limit stops before re-upload and indexing.
        assert!(h.storage.uploads.lock().unwrap().is_empty());
        assert!(h.index.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ten_pages_subscribed_is_within_pro_ceiling() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: pdf_with_pages(10),
            }),
            Arc::new(FixedEmbeddings),
            subscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "big.pdf", "http://up.test/big.pdf");

        h.pipeline.run(id).await.unwrap();

        assert_eq!(h.files.status(id), UploadStatus::Success);
        assert_eq!(h.index.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_download_failure_marks_failed() {
        let h = harness(
            Arc::new(FailingFetcher),
            Arc::new(FixedEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "gone.pdf", "http://up.test/gone.pdf");

        let result = h.pipeline.run(id).await;

        assert!(result.is_err());
        assert_eq!(h.files.status(id), UploadStatus::Failed);
        assert!(h.index.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_marks_failed_after_reupload() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: pdf_with_pages(2),
            }),
            Arc::new(FailingEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "doc.pdf", "http://up.test/doc.pdf");

        let result = h.pipeline.run(id).await;

        assert!(result.is_err());
        assert_eq!(h.files.status(id), UploadStatus::Failed);
        // The re-upload had already happened; it is not rolled back.
        assert_eq!(h.storage.uploads.lock().unwrap().len(), 1);
        assert!(h.index.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_bytes_mark_failed() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: b"this is not a pdf".to_vec(),
            }),
            Arc::new(FixedEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "junk.pdf", "http://up.test/junk.pdf");

        let result = h.pipeline.run(id).await;

        assert!(result.is_err());
        assert_eq!(h.files.status(id), UploadStatus::Failed);
    }

    #[tokio::test]
    async fn test_double_invocation_is_a_noop() {
        let h = harness(
            Arc::new(StaticFetcher {
                data: pdf_with_pages(1),
            }),
            Arc::new(FixedEmbeddings),
            unsubscribed(),
        );
        let id = h
            .files
            .insert_processing("user_1", "once.pdf", "http://up.test/once.pdf");

        h.pipeline.run(id).await.unwrap();
        h.pipeline.run(id).await.unwrap();

        assert_eq!(h.files.status(id), UploadStatus::Success);
        // The second run bailed out before touching any collaborator again.
        assert_eq!(h.index.upserts.lock().unwrap().len(), 1);
        assert_eq!(h.storage.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_record_refuses_reversal() {
        let files = InMemoryFileStore::default();
        let id = files.insert_processing("user_1", "k.pdf", "http://up.test/k.pdf");

        assert!(files
            .transition_status(id, UploadStatus::Success)
            .await
            .unwrap());
        // SUCCESS -> FAILED must not happen.
        assert!(!files
            .transition_status(id, UploadStatus::Failed)
            .await
            .unwrap());
        assert_eq!(files.status(id), UploadStatus::Success);
    }
}
