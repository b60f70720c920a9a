//! Storage abstraction trait
//!
//! This module defines the Storager trait that all storage backends must implement.

use crate::{File, ObjectAttrs, StorageBackend};
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot get GoogleStorage instance as it hasn't been initialized yet; use setup() first")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Storage client is closed")]
    Closed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Upload body accepted by [`Storager::upload`]
pub type BoxedReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// Every operation is a single round trip to the backend. Callers can hold an
/// `Arc<dyn Storager>` and swap backends (or test doubles) freely.
#[async_trait]
pub trait Storager: Send + Sync {
    /// List every object whose name starts with `prefix`.
    ///
    /// An empty prefix lists the whole bucket.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<File>>;

    /// Upload the reader's contents to `dest_filename`.
    ///
    /// The destination name is normalized first (see the crate docs); the
    /// returned record carries the normalized name.
    async fn upload(
        &self,
        reader: BoxedReader,
        dest_filename: &str,
        content_type: &str,
    ) -> StorageResult<File>;

    /// Delete one object. Deleting a missing object is an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Fetch the metadata of one object.
    async fn metadata(&self, path: &str) -> StorageResult<ObjectAttrs>;

    /// Release the underlying client.
    ///
    /// Backends holding a remote client fail later calls with
    /// [`StorageError::Closed`]; closing twice is not an error.
    async fn close(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
