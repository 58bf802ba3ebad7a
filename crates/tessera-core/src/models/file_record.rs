use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Durable metadata for a successfully ingested file.
///
/// A record exists for a path exactly when verified bytes exist at that path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub path: String,
    pub is_protected: bool,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            is_protected: false,
            created_at: Utc::now(),
        }
    }
}
