//! Tessera Database Layer
//!
//! Ticket and file-record stores. The PostgreSQL implementations are used at
//! runtime; in-memory implementations are available behind the `memory-store`
//! feature for tests and local tooling.

// Module declarations
pub mod db;

// Re-exports: store traits and PostgreSQL implementations
pub use db::{FileRecordStore, PostgresFileRecordStore, PostgresTicketStore, TicketStore};

// Re-exports: in-memory implementations
#[cfg(any(test, feature = "memory-store"))]
pub use db::{InMemoryFileRecordStore, InMemoryTicketStore};
