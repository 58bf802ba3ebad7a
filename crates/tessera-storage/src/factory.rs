use crate::{BlobStore, LocalStorage, PathResolver, StorageError, StorageResult};
use std::sync::Arc;
use tessera_core::Config;

/// Create the blob store and its matching path resolver from configuration
pub async fn create_storage(config: &Config) -> StorageResult<(Arc<dyn BlobStore>, PathResolver)> {
    let storage = LocalStorage::new(
        config.storage_root.clone(),
        config.public_base_url.clone(),
    )
    .await?;

    let resolver = PathResolver::new(storage.base_path()).map_err(|e| {
        StorageError::ConfigError(format!("Failed to resolve storage root: {}", e))
    })?;

    tracing::info!(
        root = %resolver.root().display(),
        base_url = %config.public_base_url,
        "Local blob storage ready"
    );

    Ok((Arc::new(storage), resolver))
}
