//! Storage abstraction trait
//!
//! This module defines the Storage trait that clip storage backends must
//! implement.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Streaming sink for one clip's bytes. Shut down before the write is
/// considered durable.
pub type ClipWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Storage abstraction trait
///
/// The transcode pipeline streams into a [`ClipWriter`] rather than
/// handing over a finished buffer, so backends must be able to open the
/// destination (creating any parent directories) before the first byte
/// arrives.
///
/// **Key format:** `{client_id}/{sentence_id}.mp3`; see the crate root
/// documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a streaming writer for the given key, creating parent
    /// directories as needed. An existing file at the key is truncated.
    async fn writer(&self, storage_key: &str) -> StorageResult<ClipWriter>;

    /// Delete the file at the given key. Deleting a missing file succeeds,
    /// so failure-path cleanup stays idempotent.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check whether a file exists at the given key.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Publicly resolvable URL for the file at the given key.
    fn url(&self, storage_key: &str) -> String;
}
