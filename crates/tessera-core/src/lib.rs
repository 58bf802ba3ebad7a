//! Tessera Core Library
//!
//! This crate provides the domain models, error types, configuration and content
//! digests shared by every Tessera component.

pub mod config;
pub mod digest;
pub mod error;
pub mod log_format;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use digest::{ContentDigest, DigestParseError};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use log_format::LogFormat;
pub use models::{FileRecord, NewUploadTicket, RedemptionReceipt, UploadTicket};
