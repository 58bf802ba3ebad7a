//! Application state and sub-states.
//!
//! Handlers receive `Arc<AppState>`; the sub-states group what each concern
//! needs so tests can assemble the state from in-memory collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;
use tessera_core::Config;
use tessera_db::TicketStore;
use tessera_ingest::RedemptionPipeline;

/// Database pool used by readiness checks. `None` when the stores are not
/// backed by PostgreSQL (tests, local tooling).
#[derive(Clone, Default)]
pub struct DbState {
    pub pool: Option<PgPool>,
}

/// Storage root checked by the readiness probe.
#[derive(Clone)]
pub struct StorageState {
    pub root: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: RedemptionPipeline,
    /// Ticket store, shared with the background sweeper.
    pub tickets: Arc<dyn TicketStore>,
    pub db: DbState,
    pub storage: StorageState,
}
