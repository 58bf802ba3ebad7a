//! Declared-metadata validation
//!
//! Checks the request's headers against the claimed ticket before a single
//! body byte is read. Pure: no I/O, no clock.

use tessera_core::models::UploadTicket;
use tessera_core::ContentDigest;

/// Request metadata as the caller declared it.
#[derive(Debug, Clone, Default)]
pub struct DeclaredHeaders {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub checksum: Option<String>,
}

/// First rule a request violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Content-Type does not match the upload ticket")]
    ContentTypeMismatch,

    #[error("Content-Length {declared} exceeds the ticket's limit of {limit} bytes")]
    SizeExceeded { declared: u64, limit: u64 },

    #[error("Content-MD5 header is required")]
    ChecksumMissing,

    #[error("Content-MD5 does not match the upload ticket")]
    ChecksumMismatch,
}

impl ValidationFailure {
    /// Machine-readable code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::ContentTypeMismatch => "CONTENT_TYPE_MISMATCH",
            ValidationFailure::SizeExceeded { .. } => "SIZE_EXCEEDED",
            ValidationFailure::ChecksumMissing => "CHECKSUM_MISSING",
            ValidationFailure::ChecksumMismatch => "CHECKSUM_MISMATCH",
        }
    }
}

/// Validate declared headers against `ticket`, in rule order.
///
/// On success returns the digest the body must hash to.
pub fn validate_declared(
    ticket: &UploadTicket,
    headers: &DeclaredHeaders,
) -> Result<ContentDigest, ValidationFailure> {
    if headers.content_type.as_deref() != Some(ticket.declared_content_type.as_str()) {
        return Err(ValidationFailure::ContentTypeMismatch);
    }

    if let Some(declared) = headers.content_length {
        let limit = ticket.declared_size_bytes();
        if declared > limit {
            return Err(ValidationFailure::SizeExceeded { declared, limit });
        }
    }

    let header = headers
        .checksum
        .as_deref()
        .ok_or(ValidationFailure::ChecksumMissing)?;

    // An unparseable header, or a ticket digest that cannot be read, can never match.
    let expected = ticket
        .expected_digest()
        .map_err(|_| ValidationFailure::ChecksumMismatch)?;
    let declared =
        ContentDigest::parse(header).map_err(|_| ValidationFailure::ChecksumMismatch)?;

    if declared != expected {
        return Err(ValidationFailure::ChecksumMismatch);
    }

    Ok(expected)
}
