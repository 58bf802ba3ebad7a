//! Error types module
//!
//! This module provides the core error type used throughout Tessera. Every
//! redemption outcome maps onto exactly one `AppError` variant, and each variant
//! describes its own HTTP presentation through [`ErrorMetadata`].
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Message returned for every unredeemable ticket, whatever the cause.
pub const NOT_REDEEMABLE_MESSAGE: &str = "Upload ticket is not redeemable";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for suspicious or recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_REDEEMABLE")
    fn error_code(&self) -> &'static str;

    /// Whether the same request could succeed if sent again
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Ticket absent, already used, or expired. Deliberately carries no detail.
    #[error("{}", NOT_REDEEMABLE_MESSAGE)]
    NotRedeemable,

    /// Declared request metadata does not match the ticket.
    #[error("Validation failed: {message}")]
    ValidationFailed { code: &'static str, message: String },

    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Duplicate ticket: {0}")]
    DuplicateTicket(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// `ValidationFailed` reports its own code; the table gives its fallback.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::NotRedeemable => (
            404,
            "NOT_REDEEMABLE",
            false,
            Some("Request a new upload ticket"),
            false,
            LogLevel::Debug,
        ),
        AppError::ValidationFailed { .. } => (
            400,
            "VALIDATION_FAILED",
            false,
            Some("Send headers that match the upload ticket"),
            false,
            LogLevel::Debug,
        ),
        AppError::PathTraversal(_) => (
            403,
            "PATH_TRAVERSAL",
            false,
            None,
            true,
            LogLevel::Warn,
        ),
        AppError::IngestionFailed(_) => (
            422,
            "INGESTION_FAILED",
            false,
            Some("Request a new upload ticket and upload the exact declared bytes"),
            false,
            LogLevel::Warn,
        ),
        AppError::CommitFailed(_) => (
            409,
            "COMMIT_FAILED",
            false,
            Some("Request a new upload ticket"),
            true,
            LogLevel::Error,
        ),
        AppError::DuplicateTicket(_) => (
            409,
            "DUPLICATE_TICKET",
            false,
            Some("Use a different ticket id"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::NotRedeemable => "NotRedeemable",
            AppError::ValidationFailed { .. } => "ValidationError",
            AppError::PathTraversal(_) => "PathTraversal",
            AppError::IngestionFailed(_) => "IngestionError",
            AppError::CommitFailed(_) => "CommitError",
            AppError::DuplicateTicket(_) => "DuplicateTicket",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationFailed { code, .. } => *code,
            other => app_error_static_metadata(other).1,
        }
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::NotRedeemable => NOT_REDEEMABLE_MESSAGE.to_string(),
            AppError::ValidationFailed { ref message, .. } => message.clone(),
            AppError::PathTraversal(_) => "Target path is not allowed".to_string(),
            AppError::IngestionFailed(ref msg) => msg.clone(),
            AppError::CommitFailed(_) => "File metadata could not be committed".to_string(),
            AppError::DuplicateTicket(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
