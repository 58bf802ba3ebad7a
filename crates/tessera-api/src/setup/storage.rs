//! Blob storage setup

use std::sync::Arc;

use anyhow::{Context, Result};
use tessera_core::Config;
use tessera_storage::{create_storage, BlobStore, PathResolver};

/// Create the local blob store and the resolver confined to its root
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn BlobStore>, PathResolver)> {
    create_storage(config).await.with_context(|| {
        format!(
            "Failed to initialize storage at {}",
            config.storage_root.display()
        )
    })
}
