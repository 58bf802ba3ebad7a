//! Commit coordination
//!
//! Reconciles the two halves of a stored file: the blob and its record. On any
//! failure the written blob is deleted, so the outcome is always "both exist"
//! or "neither exists".

use std::sync::Arc;

use tessera_core::models::FileRecord;
use tessera_core::AppError;
use tessera_db::FileRecordStore;
use tessera_storage::{BlobStore, ResolvedPath, StorageError};

use crate::ingest::{delete_logged, IngestReport};

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("Stored blob could not be inspected: {0}")]
    Stat(#[source] StorageError),

    #[error("Stored blob is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("File record could not be created: {0}")]
    Record(#[source] AppError),
}

/// A committed file: its record plus what the caller is told about it.
#[derive(Debug, Clone)]
pub struct CommittedFile {
    pub record: FileRecord,
    pub size: u64,
    pub url: String,
}

#[derive(Clone)]
pub struct CommitCoordinator {
    records: Arc<dyn FileRecordStore>,
    store: Arc<dyn BlobStore>,
}

impl CommitCoordinator {
    pub fn new(records: Arc<dyn FileRecordStore>, store: Arc<dyn BlobStore>) -> Self {
        Self { records, store }
    }

    /// Record the blob written at `dest`, or delete it if that cannot be done.
    pub async fn commit(
        &self,
        dest: &ResolvedPath,
        report: &IngestReport,
    ) -> Result<CommittedFile, CommitError> {
        match self.try_commit(dest, report).await {
            Ok(committed) => Ok(committed),
            Err(e) => {
                tracing::warn!(
                    target_path = %dest,
                    error = %e,
                    "Commit failed, rolling back written blob"
                );
                delete_logged(self.store.as_ref(), dest).await;
                Err(e)
            }
        }
    }

    async fn try_commit(
        &self,
        dest: &ResolvedPath,
        report: &IngestReport,
    ) -> Result<CommittedFile, CommitError> {
        let stat = self.store.stat(dest).await.map_err(CommitError::Stat)?;
        if stat.size != report.bytes {
            return Err(CommitError::SizeMismatch {
                expected: report.bytes,
                actual: stat.size,
            });
        }

        let record = self
            .records
            .insert(dest.relative())
            .await
            .map_err(CommitError::Record)?;

        Ok(CommittedFile {
            record,
            size: stat.size,
            url: self.store.public_url(dest),
        })
    }
}
