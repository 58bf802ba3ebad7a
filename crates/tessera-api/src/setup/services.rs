//! Service initialization and application state setup

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tessera_core::Config;
use tessera_db::{FileRecordStore, PostgresFileRecordStore, PostgresTicketStore, TicketStore};
use tessera_ingest::RedemptionPipeline;
use tessera_storage::{BlobStore, PathResolver};

use crate::state::{AppState, DbState, StorageState};

/// Initialize the PostgreSQL-backed stores and the redemption pipeline
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    store: Arc<dyn BlobStore>,
    resolver: PathResolver,
) -> Arc<AppState> {
    let tickets: Arc<dyn TicketStore> = Arc::new(PostgresTicketStore::new(pool.clone()));
    let records: Arc<dyn FileRecordStore> = Arc::new(PostgresFileRecordStore::new(pool.clone()));

    build_state(config, tickets, records, store, resolver, Some(pool))
}

/// Assemble application state from already-constructed collaborators
pub fn build_state(
    config: &Config,
    tickets: Arc<dyn TicketStore>,
    records: Arc<dyn FileRecordStore>,
    store: Arc<dyn BlobStore>,
    resolver: PathResolver,
    pool: Option<PgPool>,
) -> Arc<AppState> {
    let idle_timeout = (config.ingest_idle_timeout_secs > 0)
        .then(|| Duration::from_secs(config.ingest_idle_timeout_secs));
    let storage = StorageState {
        root: resolver.root().to_path_buf(),
    };

    let pipeline = RedemptionPipeline::new(tickets.clone(), records, store, resolver)
        .with_idle_timeout(idle_timeout);

    tracing::info!(
        storage_root = %storage.root.display(),
        idle_timeout_secs = config.ingest_idle_timeout_secs,
        "Redemption pipeline ready"
    );

    Arc::new(AppState {
        config: config.clone(),
        pipeline,
        tickets,
        db: DbState { pool },
        storage,
    })
}
