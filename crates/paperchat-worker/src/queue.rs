use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::pipeline::IngestPipeline;

#[derive(Debug, Clone)]
pub enum IngestJob {
    ProcessFile { file_id: Uuid },
}

/// Bounded queue feeding the ingestion worker pool.
///
/// Submission is fire-and-forget: the upload intake handler enqueues and
/// returns; it never observes the outcome. If the queue is full the job is
/// rejected and the record stays in `PROCESSING` until an operator retries.
pub struct IngestQueue {
    tx: mpsc::Sender<IngestJob>,
}

impl IngestQueue {
    /// Create a new ingest queue with a bounded channel.
    ///
    /// The channel bound is configurable via the `INGEST_QUEUE_SIZE`
    /// environment variable (default: 1000). `max_concurrent` caps how many
    /// ingestion runs execute at once.
    pub fn new(pipeline: Arc<IngestPipeline>, max_concurrent: usize) -> Self {
        let queue_size = std::env::var("INGEST_QUEUE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1000)
            .max(1);

        let (tx, rx) = mpsc::channel(queue_size);

        tokio::spawn(async move {
            Self::worker_pool(rx, pipeline, max_concurrent).await;
        });

        tracing::info!(
            queue_size = queue_size,
            max_concurrent = max_concurrent,
            "Ingest queue initialized with bounded channel"
        );

        Self { tx }
    }

    /// No-op queue for setups that never ingest (tests, tooling). Jobs
    /// submitted here go nowhere.
    pub fn noop() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { tx }
    }

    #[tracing::instrument(skip(self), fields(job.type = "ingest"))]
    pub fn submit(&self, job: IngestJob) -> Result<()> {
        match &job {
            IngestJob::ProcessFile { file_id } => {
                tracing::info!(file_id = %file_id, "Enqueuing ingest job");
            }
        }
        self.tx.try_send(job).map_err(|e| match &e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!("Ingest queue is full, rejecting job");
                anyhow::anyhow!("Ingest queue is full, please try again later")
            }
            _ => anyhow::anyhow!("Failed to submit ingest job: {}", e),
        })?;
        Ok(())
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<IngestJob>,
        pipeline: Arc<IngestPipeline>,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        while let Some(job) = rx.recv().await {
            let permit = semaphore.clone().acquire_owned().await;
            let pipeline = pipeline.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let IngestJob::ProcessFile { file_id } = job;
                if let Err(e) = pipeline.run(file_id).await {
                    tracing::error!(file_id = %file_id, error = %e, "Ingest job failed");
                }
            });
        }
    }
}

impl Clone for IngestQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
