//! Background ingestion: a bounded job queue and the pipeline that turns a
//! freshly uploaded file record into a terminal `SUCCESS` or `FAILED` state.
//!
//! The queue is fire-and-forget from the API's perspective; the only
//! observability for a failed run is the record's status plus logs.

mod pipeline;
mod queue;

pub use pipeline::{IngestContext, IngestPipeline};
pub use queue::{IngestJob, IngestQueue};
