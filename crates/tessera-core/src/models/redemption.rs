use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::FileRecord;

/// Response after a ticket has been redeemed and the file committed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedemptionReceipt {
    /// File record ID
    pub id: Uuid,
    /// Stored path, relative to the storage root
    pub path: String,
    /// Bytes written
    pub size: u64,
    pub content_type: String,
    /// Public access URL
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub is_protected: bool,
}

impl RedemptionReceipt {
    pub fn from_record(record: FileRecord, size: u64, content_type: String, url: String) -> Self {
        Self {
            id: record.id,
            path: record.path,
            size,
            content_type,
            url,
            created_at: record.created_at,
            is_protected: record.is_protected,
        }
    }
}
