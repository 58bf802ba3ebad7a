//! Database repositories for data access layer
//!
//! The ticket store owns ticket rows and the only mutation that matters for
//! them, the atomic claim. The file-record store owns file metadata rows.
//
// Ticket store (create, claim, purge)
pub mod ticket;
//
// File record store (insert, existence check)
pub mod file_record;
//
// In-memory stores for tests
#[cfg(any(test, feature = "memory-store"))]
pub mod memory;

pub use file_record::{FileRecordStore, PostgresFileRecordStore};
#[cfg(any(test, feature = "memory-store"))]
pub use memory::{InMemoryFileRecordStore, InMemoryTicketStore};
pub use ticket::{PostgresTicketStore, TicketStore};

/// Whether a database error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
