//! Blob store abstraction
//!
//! The ingestion engine writes through [`BlobStore`] and never touches the
//! filesystem directly. Every operation takes a [`ResolvedPath`], so nothing can
//! reach a backend without passing the path resolver first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::paths::ResolvedPath;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Size and modification time of a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Durable byte storage addressed by resolved path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the destination's parent directories. Idempotent.
    async fn ensure_parent(&self, path: &ResolvedPath) -> StorageResult<()>;

    /// Open the destination for exclusive write.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if anything is already stored
    /// at `path`; the existing blob is left untouched.
    async fn open_exclusive(&self, path: &ResolvedPath) -> StorageResult<Box<dyn BlobWriter>>;

    /// Delete the blob at `path`. Deleting a missing blob succeeds.
    async fn delete(&self, path: &ResolvedPath) -> StorageResult<()>;

    async fn stat(&self, path: &ResolvedPath) -> StorageResult<BlobStat>;

    async fn exists(&self, path: &ResolvedPath) -> StorageResult<bool>;

    /// Public access URL for a stored blob
    fn public_url(&self, path: &ResolvedPath) -> String;
}

/// Handle to a blob opened by [`BlobStore::open_exclusive`].
#[async_trait]
pub trait BlobWriter: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()>;

    /// Flush and make the written bytes durable.
    async fn finish(self: Box<Self>) -> StorageResult<()>;
}
