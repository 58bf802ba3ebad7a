//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use tessera_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tessera API",
        version = "0.1.0",
        description = "Single-use upload tickets. A ticket authorizes exactly one upload of one file to one target path with a declared content type, size and MD5 checksum. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::redeem::redeem_upload,
        handlers::health::liveness_check,
        handlers::health::readiness_check,
    ),
    components(schemas(
        models::RedemptionReceipt,
        error::ErrorResponse,
        handlers::health::ReadinessResponse,
    )),
    tags(
        (name = "uploads", description = "Upload ticket redemption"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
