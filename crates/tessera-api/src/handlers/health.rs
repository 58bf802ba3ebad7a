//! Health check handlers and response types.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::HEALTH_CHECK_TIMEOUT_SECS;
use crate::state::AppState;

const TIMEOUT: Duration = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

/// Run an async check with timeout; returns "ready", "timeout", or "not_ready: {error}".
async fn run_check<F, E>(timeout: Duration, f: F) -> (bool, String)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => (true, "ready".to_string()),
        Ok(Err(e)) => (false, format!("not_ready: {}", e)),
        Err(_) => (false, "timeout".to_string()),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

/// Liveness probe - process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - database reachable and storage root present.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to redeem tickets", body = ReadinessResponse),
        (status = 503, description = "A dependency is unavailable", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (db_ok, database) = match state.db.pool.clone() {
        Some(pool) => {
            run_check(TIMEOUT, async move {
                sqlx::query("SELECT 1").execute(&pool).await.map(drop)
            })
            .await
        }
        None => (true, "not_configured".to_string()),
    };
    if !db_ok {
        tracing::error!(database = %database, "Database readiness check failed");
    }

    let root = state.storage.root.clone();
    let (storage_ok, storage) = run_check(TIMEOUT, async move {
        let metadata = tokio::fs::metadata(&root).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(std::io::Error::other("storage root is not a directory"))
        }
    })
    .await;
    if !storage_ok {
        tracing::error!(storage = %storage, "Storage readiness check failed");
    }

    let ready = db_ok && storage_ok;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            database,
            storage,
        }),
    )
}
