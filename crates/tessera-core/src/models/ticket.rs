use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::digest::{ContentDigest, DigestParseError};

/// Single-use, time-bounded authorization to write one file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadTicket {
    /// Redemption key
    pub id: String,
    /// Logical path, relative to the storage root
    pub target_path: String,
    pub declared_content_type: String,
    /// Upper bound on the body size in bytes
    pub declared_size: i64,
    /// MD5 of the expected bytes, hex or base64
    pub declared_checksum: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl UploadTicket {
    /// Whether a claim at `now` would succeed.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }

    pub fn declared_size_bytes(&self) -> u64 {
        u64::try_from(self.declared_size).unwrap_or(0)
    }

    pub fn expected_digest(&self) -> Result<ContentDigest, DigestParseError> {
        ContentDigest::parse(&self.declared_checksum)
    }
}

/// Ticket as handed over by the issuing side, before it is stored.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_expiry_window"))]
pub struct NewUploadTicket {
    #[validate(length(
        min = 1,
        max = 128,
        message = "Ticket id must be between 1 and 128 characters"
    ))]
    pub id: String,
    #[validate(length(
        min = 1,
        max = 1024,
        message = "Target path must be between 1 and 1024 characters"
    ))]
    pub target_path: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub declared_content_type: String,
    #[validate(range(min = 1, message = "Declared size must be at least 1 byte"))]
    pub declared_size: i64,
    #[validate(custom(function = "validate_checksum"))]
    pub declared_checksum: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewUploadTicket {
    /// Ticket valid for `ttl` starting now.
    pub fn new(
        id: impl Into<String>,
        target_path: impl Into<String>,
        declared_content_type: impl Into<String>,
        declared_size: i64,
        declared_checksum: impl Into<String>,
        ttl: chrono::Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: id.into(),
            target_path: target_path.into(),
            declared_content_type: declared_content_type.into(),
            declared_size,
            declared_checksum: declared_checksum.into(),
            expires_at: created_at + ttl,
            created_at,
        }
    }

    /// Stored form of this ticket, not yet used.
    pub fn into_ticket(self) -> UploadTicket {
        UploadTicket {
            id: self.id,
            target_path: self.target_path,
            declared_content_type: self.declared_content_type,
            declared_size: self.declared_size,
            declared_checksum: self.declared_checksum,
            expires_at: self.expires_at,
            created_at: self.created_at,
            used: false,
            used_at: None,
        }
    }
}

fn validate_checksum(value: &str) -> Result<(), ValidationError> {
    ContentDigest::parse(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("checksum");
        err.message = Some("Checksum must be an MD5 digest in hex or base64".into());
        err
    })
}

fn validate_expiry_window(ticket: &NewUploadTicket) -> Result<(), ValidationError> {
    if ticket.expires_at <= ticket.created_at {
        let mut err = ValidationError::new("expiry_window");
        err.message = Some("expires_at must be after created_at".into());
        return Err(err);
    }
    Ok(())
}
