use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tessera_core::models::{NewUploadTicket, UploadTicket};
use tessera_core::AppError;
use validator::Validate;

use super::is_unique_violation;

/// Durable record of issued upload tickets.
///
/// Implementations must make `claim` a single atomic compare-and-flip. No
/// caller-side lock is taken anywhere; concurrent claims for one id are ordered
/// entirely by the store.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a new ticket. Fails with `AppError::DuplicateTicket` if the id is taken.
    async fn create(&self, ticket: NewUploadTicket) -> Result<UploadTicket, AppError>;

    /// Mark the ticket used if it is unused and unexpired at `now`, returning it.
    ///
    /// `None` covers absent, already used and expired alike. Callers cannot and
    /// must not tell these apart.
    async fn claim(&self, id: &str, now: DateTime<Utc>) -> Result<Option<UploadTicket>, AppError>;

    /// Delete every ticket with `expires_at < now`, used or not. Returns the count removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Read a ticket without claiming it. Operator and test use only.
    async fn get(&self, id: &str) -> Result<Option<UploadTicket>, AppError>;
}

const TICKET_COLUMNS: &str = "id, target_path, declared_content_type, declared_size, \
     declared_checksum, expires_at, created_at, used, used_at";

/// PostgreSQL ticket store
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn create(&self, ticket: NewUploadTicket) -> Result<UploadTicket, AppError> {
        ticket.validate()?;

        let id = ticket.id.clone();
        let query = format!(
            r#"
            INSERT INTO upload_tickets (
                id, target_path, declared_content_type, declared_size,
                declared_checksum, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TICKET_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UploadTicket>(&query)
            .bind(ticket.id)
            .bind(ticket.target_path)
            .bind(ticket.declared_content_type)
            .bind(ticket.declared_size)
            .bind(ticket.declared_checksum)
            .bind(ticket.expires_at)
            .bind(ticket.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateTicket(format!("Ticket {} already exists", id))
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn claim(&self, id: &str, now: DateTime<Utc>) -> Result<Option<UploadTicket>, AppError> {
        // One conditional statement; zero rows means not redeemable for any reason.
        let query = format!(
            r#"
            UPDATE upload_tickets
            SET used = TRUE, used_at = $2
            WHERE id = $1 AND used = FALSE AND expires_at > $2
            RETURNING {TICKET_COLUMNS}
            "#
        );

        let ticket = sqlx::query_as::<_, UploadTicket>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM upload_tickets WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            purged = result.rows_affected(),
            cutoff = %now,
            "Purged expired upload tickets"
        );

        Ok(result.rows_affected())
    }

    async fn get(&self, id: &str) -> Result<Option<UploadTicket>, AppError> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM upload_tickets WHERE id = $1");

        let ticket = sqlx::query_as::<_, UploadTicket>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }
}
