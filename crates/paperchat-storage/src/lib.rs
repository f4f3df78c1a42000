//! Blob storage abstraction.
//!
//! Uploaded and generated documents are opaque byte payloads addressed by a
//! storage key. The [`Storage`] trait hides the backend; S3 (or any
//! S3-compatible endpoint) and the local filesystem are provided. Pick one
//! with [`factory::create_storage`] from configuration.
//!
//! **Key format:** `uploads/{user_id}/{filename}` for user uploads and
//! `generated/{filename}` for regenerated documents. See [`keys`].

mod factory;
pub mod keys;
mod local;
mod s3;
mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
