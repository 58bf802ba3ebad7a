//! Route configuration and setup

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tessera_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::constants::API_PREFIX;
use crate::handlers::{health, redeem};
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // The pipeline enforces each ticket's declared size; this ceiling only
    // bounds what the transport will accept at all.
    let body_limit = usize::try_from(config.max_upload_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new().route("/uploads/{ticket_id}", put(redeem::redeem_upload));

    let app = Router::new()
        .nest(API_PREFIX, api_routes)
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        max_upload_bytes = config.max_upload_bytes,
        "Routes configured"
    );

    Ok(app)
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::PUT, Method::OPTIONS];
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", o))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
