//! Shared helpers for the `tessera-admin` operator CLI.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tessera_core::digest::DigestHasher;
use tessera_core::{ContentDigest, NewUploadTicket};
use tokio::io::AsyncReadExt;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// MD5 digest and byte size of a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub digest: ContentDigest,
    pub size: u64,
}

/// Hash `path` without loading it into memory.
pub async fn digest_file(path: &Path) -> anyhow::Result<FileDigest> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut hasher = DigestHasher::new();
    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    let mut size = 0u64;
    loop {
        let n = file
            .read(&mut buf)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok(FileDigest {
        digest: hasher.finalize(),
        size,
    })
}

/// Build a ticket that authorizes uploading exactly the bytes of `file`.
pub async fn ticket_for_file(
    id: String,
    file: &Path,
    target_path: String,
    content_type: String,
    ttl: chrono::Duration,
) -> anyhow::Result<NewUploadTicket> {
    let FileDigest { digest, size } = digest_file(file).await?;
    if size == 0 {
        anyhow::bail!("{} is empty; tickets require at least one byte", file.display());
    }
    let size = i64::try_from(size).context("File is too large for a ticket")?;

    Ok(NewUploadTicket::new(
        id,
        target_path,
        content_type,
        size,
        digest.to_base64(),
        ttl,
    ))
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn digest_file_matches_in_memory_digest() {
        let file = temp_file(b"hello world");

        let result = digest_file(file.path()).await.unwrap();

        assert_eq!(result.size, 11);
        assert_eq!(result.digest.to_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[tokio::test]
    async fn digest_spans_multiple_reads() {
        let content = vec![7u8; READ_BUFFER_BYTES * 2 + 5];
        let file = temp_file(&content);

        let result = digest_file(file.path()).await.unwrap();

        assert_eq!(result.size, content.len() as u64);
        assert_eq!(result.digest, ContentDigest::compute(&content));
    }

    #[tokio::test]
    async fn ticket_carries_file_size_and_checksum() {
        let file = temp_file(b"hello world");

        let ticket = ticket_for_file(
            "tkt-1".to_string(),
            file.path(),
            "docs/hello.txt".to_string(),
            "text/plain".to_string(),
            chrono::Duration::minutes(15),
        )
        .await
        .unwrap();

        assert_eq!(ticket.declared_size, 11);
        assert_eq!(ticket.declared_checksum, "XrY7u+Ae7tCTyyK7j1rNww==");
        assert_eq!(ticket.target_path, "docs/hello.txt");
        assert!(ticket.expires_at > ticket.created_at);
    }

    #[tokio::test]
    async fn empty_file_cannot_be_ticketed() {
        let file = temp_file(b"");

        let result = ticket_for_file(
            "tkt-empty".to_string(),
            file.path(),
            "empty.txt".to_string(),
            "text/plain".to_string(),
            chrono::Duration::minutes(15),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(digest_file(&dir.path().join("absent")).await.is_err());
    }
}
