use crate::paths::{normalize, ResolvedPath};
use crate::traits::{BlobStat, BlobStore, BlobWriter, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Bytes escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tessera/files")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let base_path = std::path::absolute(&base_path)
            .map(|p| normalize(&p))
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to resolve storage directory: {}", e))
            })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Filesystem location for a resolved path, refusing anything outside the base.
    fn locate<'a>(&self, path: &'a ResolvedPath) -> StorageResult<&'a Path> {
        let absolute = path.absolute();
        if absolute.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidPath(
                "Path resolves outside storage directory".to_string(),
            ));
        }
        Ok(absolute)
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn ensure_parent(&self, path: &ResolvedPath) -> StorageResult<()> {
        let absolute = self.locate(path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn open_exclusive(&self, path: &ResolvedPath) -> StorageResult<Box<dyn BlobWriter>> {
        let absolute = self.locate(path)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(absolute)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.relative().to_string()),
                _ => StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    absolute.display(),
                    e
                )),
            })?;

        Ok(Box::new(LocalBlobWriter {
            file,
            path: absolute.to_path_buf(),
        }))
    }

    async fn delete(&self, path: &ResolvedPath) -> StorageResult<()> {
        let absolute = self.locate(path)?;
        let start = std::time::Instant::now();

        match fs::remove_file(absolute).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    absolute.display(),
                    e
                )))
            }
        }

        tracing::debug!(
            path = %absolute.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn stat(&self, path: &ResolvedPath) -> StorageResult<BlobStat> {
        let absolute = self.locate(path)?;
        let meta = fs::metadata(absolute).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.relative().to_string()),
            _ => StorageError::IoError(e),
        })?;

        Ok(BlobStat {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn exists(&self, path: &ResolvedPath) -> StorageResult<bool> {
        let absolute = self.locate(path)?;
        Ok(fs::try_exists(absolute).await?)
    }

    fn public_url(&self, path: &ResolvedPath) -> String {
        let encoded: Vec<String> = path
            .relative()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }
}

struct LocalBlobWriter {
    file: fs::File,
    path: PathBuf,
}

#[async_trait]
impl BlobWriter for LocalBlobWriter {
    async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.file.write_all(chunk).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", self.path.display(), e))
        })
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<()> {
        self.file.flush().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to flush file {}: {}", self.path.display(), e))
        })?;
        self.file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", self.path.display(), e))
        })
    }
}
