//! Streaming ingestion
//!
//! Writes a request body to the blob store while hashing it. After
//! [`IngestEngine::ingest`] returns, either the destination holds exactly the
//! verified bytes or nothing exists at the destination. That holds for
//! checksum mismatches, oversized bodies, read and write failures, and for the
//! ingest future being dropped mid-stream.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tessera_core::digest::DigestHasher;
use tessera_core::ContentDigest;
use tessera_storage::{BlobStore, BlobWriter, ResolvedPath, StorageError};
use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Destination is already occupied: {0}")]
    DestinationOccupied(String),

    #[error("Upload body exceeds the declared size of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    #[error("Uploaded content does not match the declared checksum")]
    ChecksumMismatch {
        expected: ContentDigest,
        actual: ContentDigest,
    },

    #[error("Reading the upload body failed: {0}")]
    Read(String),

    #[error("No upload data received for {0:?}")]
    Timeout(Duration),

    #[error("Writing the upload failed: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a verified ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub bytes: u64,
    pub digest: ContentDigest,
}

#[derive(Clone)]
pub struct IngestEngine {
    store: Arc<dyn BlobStore>,
    idle_timeout: Option<Duration>,
}

impl IngestEngine {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            idle_timeout: None,
        }
    }

    /// Fail when no chunk arrives within `timeout`. `None` waits indefinitely.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Stream `body` into `dest`, accepting at most `max_bytes` and requiring the
    /// content to hash to `expected`.
    pub async fn ingest<S, E>(
        &self,
        body: S,
        dest: &ResolvedPath,
        expected: &ContentDigest,
        max_bytes: u64,
    ) -> Result<IngestReport, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: std::fmt::Display,
    {
        self.store.ensure_parent(dest).await?;

        let (writer, guard) = self.open_guarded(dest).await?;

        match self.copy_verified(writer, body, expected, max_bytes).await {
            Ok(report) => {
                guard.disarm();
                tracing::debug!(
                    target_path = %dest,
                    bytes = report.bytes,
                    "Upload body written and verified"
                );
                Ok(report)
            }
            Err(e) => {
                guard.discard().await;
                Err(e)
            }
        }
    }

    /// Create the destination and arm its guard on a task of its own.
    ///
    /// The guard exists as soon as the file does, so a caller dropped while the
    /// open is in flight still gets the new file removed. A failed exclusive
    /// open leaves whatever is already there untouched.
    async fn open_guarded(
        &self,
        dest: &ResolvedPath,
    ) -> Result<(Box<dyn BlobWriter>, PartialBlobGuard), IngestError> {
        let (tx, rx) = oneshot::channel();
        let store = self.store.clone();
        let path = dest.clone();
        tokio::spawn(async move {
            let opened = store
                .open_exclusive(&path)
                .await
                .map(|writer| (writer, PartialBlobGuard::new(store.clone(), path)));
            // An unreceived writer drops its guard, which removes the file.
            let _ = tx.send(opened);
        });

        let opened = rx.await.map_err(|_| {
            IngestError::Storage(StorageError::WriteFailed(format!(
                "open task for {} ended without a result",
                dest
            )))
        })?;

        opened.map_err(|e| match e {
            StorageError::AlreadyExists(path) => IngestError::DestinationOccupied(path),
            other => IngestError::Storage(other),
        })
    }

    async fn copy_verified<S, E>(
        &self,
        mut writer: Box<dyn BlobWriter>,
        mut body: S,
        expected: &ContentDigest,
        max_bytes: u64,
    ) -> Result<IngestReport, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: std::fmt::Display,
    {
        let mut hasher = DigestHasher::new();
        let mut total: u64 = 0;

        while let Some(chunk) = self.next_chunk(&mut body).await? {
            total += chunk.len() as u64;
            if total > max_bytes {
                return Err(IngestError::SizeLimitExceeded { limit: max_bytes });
            }
            hasher.update(&chunk);
            writer.write_chunk(&chunk).await?;
        }

        writer.finish().await?;

        let actual = hasher.finalize();
        if actual != *expected {
            return Err(IngestError::ChecksumMismatch {
                expected: *expected,
                actual,
            });
        }

        Ok(IngestReport {
            bytes: total,
            digest: actual,
        })
    }

    async fn next_chunk<S, E>(&self, body: &mut S) -> Result<Option<Bytes>, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: std::fmt::Display,
    {
        let next = match self.idle_timeout {
            Some(timeout) => tokio::time::timeout(timeout, body.next())
                .await
                .map_err(|_| IngestError::Timeout(timeout))?,
            None => body.next().await,
        };

        match next {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(IngestError::Read(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Deletes a partially written blob unless disarmed.
///
/// Explicit failures call [`discard`](Self::discard) and wait for the delete.
/// If the owning future is dropped instead, `Drop` hands the delete to the runtime.
pub(crate) struct PartialBlobGuard {
    store: Arc<dyn BlobStore>,
    path: Option<ResolvedPath>,
}

impl PartialBlobGuard {
    pub(crate) fn new(store: Arc<dyn BlobStore>, path: ResolvedPath) -> Self {
        Self {
            store,
            path: Some(path),
        }
    }

    pub(crate) fn disarm(mut self) {
        self.path = None;
    }

    pub(crate) async fn discard(mut self) {
        if let Some(path) = self.path.take() {
            delete_logged(self.store.as_ref(), &path).await;
        }
    }
}

impl Drop for PartialBlobGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };

        tracing::warn!(target_path = %path, "Ingestion cancelled, removing partial upload");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.store.clone();
                handle.spawn(async move {
                    delete_logged(store.as_ref(), &path).await;
                });
            }
            Err(_) => {
                tracing::error!(
                    target_path = %path,
                    "No runtime available to remove partial upload"
                );
            }
        }
    }
}

/// Best-effort delete; failure is logged and never replaces the caller's error.
pub(crate) async fn delete_logged(store: &dyn BlobStore, path: &ResolvedPath) {
    if let Err(e) = store.delete(path).await {
        tracing::error!(
            target_path = %path,
            absolute_path = %path.absolute().display(),
            error = %e,
            "Failed to delete blob during cleanup"
        );
    }
}
