//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use tessera_core::Config;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration, before anything connects
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let (store, resolver) = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, pool, store, resolver);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
