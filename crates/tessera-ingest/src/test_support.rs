//! Fault-injecting collaborators for pipeline tests.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use tessera_core::models::FileRecord;
use tessera_core::AppError;
use tessera_db::FileRecordStore;
use tessera_storage::{
    BlobStat, BlobStore, BlobWriter, LocalStorage, ResolvedPath, StorageError, StorageResult,
};

pub(crate) fn body_of(
    chunks: &[&str],
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + Unpin {
    let chunks: Vec<_> = chunks
        .iter()
        .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
        .collect();
    stream::iter(chunks)
}

/// Local storage with optional injected faults.
pub(crate) struct FaultyStore {
    inner: Arc<LocalStorage>,
    fail_writes_after: Option<usize>,
    fail_deletes: bool,
    stat_size_override: Option<u64>,
    open_delay: Option<Duration>,
}

impl FaultyStore {
    pub(crate) fn failing_writes_after(inner: Arc<LocalStorage>, bytes: usize) -> Self {
        Self {
            inner,
            fail_writes_after: Some(bytes),
            fail_deletes: false,
            stat_size_override: None,
            open_delay: None,
        }
    }

    pub(crate) fn failing_deletes(inner: Arc<LocalStorage>) -> Self {
        Self {
            inner,
            fail_writes_after: None,
            fail_deletes: true,
            stat_size_override: None,
            open_delay: None,
        }
    }

    pub(crate) fn misreporting_size(inner: Arc<LocalStorage>, size: u64) -> Self {
        Self {
            inner,
            fail_writes_after: None,
            fail_deletes: false,
            stat_size_override: Some(size),
            open_delay: None,
        }
    }

    /// Creates the file, then stalls for `delay` before returning the writer.
    pub(crate) fn slow_to_open(inner: Arc<LocalStorage>, delay: Duration) -> Self {
        Self {
            inner,
            fail_writes_after: None,
            fail_deletes: false,
            stat_size_override: None,
            open_delay: Some(delay),
        }
    }
}

#[async_trait]
impl BlobStore for FaultyStore {
    async fn ensure_parent(&self, path: &ResolvedPath) -> StorageResult<()> {
        self.inner.ensure_parent(path).await
    }

    async fn open_exclusive(&self, path: &ResolvedPath) -> StorageResult<Box<dyn BlobWriter>> {
        let inner = self.inner.open_exclusive(path).await?;
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Box::new(FaultyWriter {
            inner,
            written: 0,
            fail_after: self.fail_writes_after,
        }))
    }

    async fn delete(&self, path: &ResolvedPath) -> StorageResult<()> {
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed("injected delete failure".to_string()));
        }
        self.inner.delete(path).await
    }

    async fn stat(&self, path: &ResolvedPath) -> StorageResult<BlobStat> {
        let mut stat = self.inner.stat(path).await?;
        if let Some(size) = self.stat_size_override {
            stat.size = size;
        }
        Ok(stat)
    }

    async fn exists(&self, path: &ResolvedPath) -> StorageResult<bool> {
        self.inner.exists(path).await
    }

    fn public_url(&self, path: &ResolvedPath) -> String {
        self.inner.public_url(path)
    }
}

struct FaultyWriter {
    inner: Box<dyn BlobWriter>,
    written: usize,
    fail_after: Option<usize>,
}

#[async_trait]
impl BlobWriter for FaultyWriter {
    async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        if let Some(limit) = self.fail_after {
            if self.written + chunk.len() > limit {
                return Err(StorageError::WriteFailed("injected disk full".to_string()));
            }
        }
        self.written += chunk.len();
        self.inner.write_chunk(chunk).await
    }

    async fn finish(self: Box<Self>) -> StorageResult<()> {
        self.inner.finish().await
    }
}

/// File record store whose inserts fail while `failing` is set.
#[derive(Default)]
pub(crate) struct RejectingRecordStore {
    pub(crate) failing: AtomicBool,
}

impl RejectingRecordStore {
    pub(crate) fn rejecting() -> Self {
        Self {
            failing: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl FileRecordStore for RejectingRecordStore {
    async fn insert(&self, path: &str) -> Result<FileRecord, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal(format!(
                "injected insert failure for {}",
                path
            )));
        }
        Ok(FileRecord::new(path))
    }

    async fn exists_for_path(&self, _path: &str) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// File record store that is unreachable for lookups and panics on insert.
pub(crate) enum BrokenRecordStore {
    LookupFails,
    InsertPanics,
}

#[async_trait]
impl FileRecordStore for BrokenRecordStore {
    async fn insert(&self, path: &str) -> Result<FileRecord, AppError> {
        match self {
            BrokenRecordStore::InsertPanics => panic!("injected insert panic for {}", path),
            BrokenRecordStore::LookupFails => Ok(FileRecord::new(path)),
        }
    }

    async fn exists_for_path(&self, _path: &str) -> Result<bool, AppError> {
        match self {
            BrokenRecordStore::LookupFails => {
                Err(AppError::Internal("injected lookup failure".to_string()))
            }
            BrokenRecordStore::InsertPanics => Ok(false),
        }
    }
}
