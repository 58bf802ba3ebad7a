//! Tessera Ingest Library
//!
//! The ticket redemption pipeline and its stages: declared-metadata
//! validation, streaming ingestion with checksum verification, and the commit
//! step that pairs each stored blob with its file record.

pub mod commit;
pub mod ingest;
pub mod pipeline;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use commit::{CommitCoordinator, CommitError, CommittedFile};
pub use ingest::{IngestEngine, IngestError, IngestReport};
pub use pipeline::{RedemptionError, RedemptionPipeline, RedemptionStage};
pub use validator::{validate_declared, DeclaredHeaders, ValidationFailure};
