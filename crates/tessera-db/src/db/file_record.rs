use async_trait::async_trait;
use sqlx::PgPool;
use tessera_core::models::FileRecord;
use tessera_core::AppError;

use super::is_unique_violation;

/// Metadata store for committed files.
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Create the record for `path`. Paths are unique.
    async fn insert(&self, path: &str) -> Result<FileRecord, AppError>;

    async fn exists_for_path(&self, path: &str) -> Result<bool, AppError>;
}

/// PostgreSQL file record store
#[derive(Clone)]
pub struct PostgresFileRecordStore {
    pool: PgPool,
}

impl PostgresFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordStore for PostgresFileRecordStore {
    async fn insert(&self, path: &str) -> Result<FileRecord, AppError> {
        let record = FileRecord::new(path);

        sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO file_records (id, path, is_protected, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, path, is_protected, created_at
            "#,
        )
        .bind(record.id)
        .bind(&record.path)
        .bind(record.is_protected)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidInput(format!("A file record already exists for {}", path))
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn exists_for_path(&self, path: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM file_records WHERE path = $1)")
                .bind(path)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
