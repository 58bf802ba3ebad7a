//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that
//! converts into `AppError` converts into `HttpAppError`, so `?` renders every
//! failure with the same status mapping, body shape and logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tessera_core::{AppError, ErrorMetadata, LogLevel};
use tessera_ingest::RedemptionError;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Build the client-facing body for `error`. Details are only included
    /// outside production, and never for sensitive errors.
    pub fn from_app_error(error: &AppError, is_production: bool) -> Self {
        let expose = !is_production && !error.is_sensitive();
        Self {
            error: error.client_message(),
            details: expose.then(|| error.detailed_message()),
            error_type: expose.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse (orphan rule: both the
/// trait and AppError are foreign to this crate).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<RedemptionError> for HttpAppError {
    fn from(err: RedemptionError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, code = code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, code = code, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::from_app_error(app_error, is_production_env());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::error::NOT_REDEEMABLE_MESSAGE;
    use tessera_ingest::ValidationFailure;

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::from_app_error(&AppError::NotRedeemable, false);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json.get("error").and_then(|v| v.as_str()),
            Some(NOT_REDEEMABLE_MESSAGE)
        );
        assert_eq!(
            json.get("code").and_then(|v| v.as_str()),
            Some("NOT_REDEEMABLE")
        );
        assert!(json.get("recoverable").and_then(|v| v.as_bool()).is_some());
    }

    #[test]
    fn test_production_hides_details() {
        let err = AppError::IngestionFailed("checksum mismatch".to_string());
        let dev = ErrorResponse::from_app_error(&err, false);
        let prod = ErrorResponse::from_app_error(&err, true);
        assert!(dev.details.is_some());
        assert!(prod.details.is_none());
        assert!(prod.error_type.is_none());
        assert_eq!(dev.code, prod.code);
    }

    #[test]
    fn test_sensitive_errors_never_expose_details() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        let response = ErrorResponse::from_app_error(&err, false);
        assert!(response.details.is_none());
        assert_eq!(response.code, "DATABASE_ERROR");
    }

    #[test]
    fn test_redemption_validation_keeps_failure_code() {
        let HttpAppError(app_err) =
            RedemptionError::Validation(ValidationFailure::ChecksumMissing).into();
        assert_eq!(app_err.http_status_code(), 400);
        assert_eq!(app_err.error_code(), "CHECKSUM_MISSING");
    }

    #[test]
    fn test_into_response_uses_metadata_status() {
        let response = HttpAppError(AppError::PathTraversal("../x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
