//! Core domain types for paperchat: models, errors, and configuration.
//!
//! Everything here is infrastructure-free. Database access lives in
//! `paperchat-db`, blob storage in `paperchat-storage`, and external
//! service clients in `paperchat-services`.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::{Config, GenerationStrategy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
