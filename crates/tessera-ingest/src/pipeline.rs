//! Redemption pipeline: claim → validate → resolve → ingest → commit.
//!
//! Every failure is terminal for the request and maps to exactly one
//! [`RedemptionError`] variant. Nothing is retried; retrying a claim would break
//! single use. Once claimed, a ticket stays used even if a later stage fails.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use tessera_core::error::NOT_REDEEMABLE_MESSAGE;
use tessera_core::models::RedemptionReceipt;
use tessera_core::AppError;
use tessera_db::{FileRecordStore, TicketStore};
use tessera_storage::{BlobStore, PathResolver, PathTraversal};

use crate::commit::{CommitCoordinator, CommitError};
use crate::ingest::{delete_logged, IngestEngine, IngestError};
use crate::validator::{validate_declared, DeclaredHeaders, ValidationFailure};

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionStage {
    Start,
    Claimed,
    Validated,
    PathResolved,
    Ingested,
    Committed,
}

impl fmt::Display for RedemptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RedemptionStage::Start => "start",
            RedemptionStage::Claimed => "claimed",
            RedemptionStage::Validated => "validated",
            RedemptionStage::PathResolved => "path_resolved",
            RedemptionStage::Ingested => "ingested",
            RedemptionStage::Committed => "committed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    /// Absent, used and expired tickets are deliberately indistinguishable.
    #[error("{}", NOT_REDEEMABLE_MESSAGE)]
    NotRedeemable,

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    PathTraversal(#[from] PathTraversal),

    #[error(transparent)]
    Ingestion(#[from] IngestError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("Internal error after {stage}: {source}")]
    Internal {
        stage: RedemptionStage,
        #[source]
        source: AppError,
    },
}

impl RedemptionError {
    fn internal(stage: RedemptionStage) -> impl FnOnce(AppError) -> Self {
        move |source| RedemptionError::Internal { stage, source }
    }

    /// Last stage reached before the failure.
    pub fn stage(&self) -> RedemptionStage {
        match self {
            RedemptionError::NotRedeemable => RedemptionStage::Start,
            RedemptionError::Validation(_) => RedemptionStage::Claimed,
            RedemptionError::PathTraversal(_) => RedemptionStage::Validated,
            RedemptionError::Ingestion(_) => RedemptionStage::PathResolved,
            RedemptionError::Commit(_) => RedemptionStage::Ingested,
            RedemptionError::Internal { stage, .. } => *stage,
        }
    }
}

impl From<RedemptionError> for AppError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::NotRedeemable => AppError::NotRedeemable,
            RedemptionError::Validation(failure) => AppError::ValidationFailed {
                code: failure.code(),
                message: failure.to_string(),
            },
            RedemptionError::PathTraversal(e) => AppError::PathTraversal(e.0),
            RedemptionError::Ingestion(e) => AppError::IngestionFailed(e.to_string()),
            RedemptionError::Commit(e) => AppError::CommitFailed(e.to_string()),
            RedemptionError::Internal { source, .. } => AppError::InternalWithSource {
                message: source.to_string(),
                source: anyhow::Error::new(source),
            },
        }
    }
}

/// Sequences the redemption of one ticket.
#[derive(Clone)]
pub struct RedemptionPipeline {
    tickets: Arc<dyn TicketStore>,
    records: Arc<dyn FileRecordStore>,
    store: Arc<dyn BlobStore>,
    resolver: PathResolver,
    engine: IngestEngine,
    coordinator: CommitCoordinator,
}

impl RedemptionPipeline {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        records: Arc<dyn FileRecordStore>,
        store: Arc<dyn BlobStore>,
        resolver: PathResolver,
    ) -> Self {
        Self {
            tickets,
            coordinator: CommitCoordinator::new(records.clone(), store.clone()),
            records,
            resolver,
            engine: IngestEngine::new(store.clone()),
            store,
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.engine = self.engine.with_idle_timeout(timeout);
        self
    }

    /// Redeem `ticket_id` with the given headers and body.
    #[tracing::instrument(skip_all, fields(ticket_id = %ticket_id))]
    pub async fn redeem<S, E>(
        &self,
        ticket_id: &str,
        headers: DeclaredHeaders,
        body: S,
    ) -> Result<RedemptionReceipt, RedemptionError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: fmt::Display,
    {
        let ticket = self
            .tickets
            .claim(ticket_id, Utc::now())
            .await
            .map_err(RedemptionError::internal(RedemptionStage::Start))?
            .ok_or(RedemptionError::NotRedeemable)?;
        tracing::debug!(stage = %RedemptionStage::Claimed, "Ticket claimed");

        let expected = validate_declared(&ticket, &headers)?;
        tracing::debug!(stage = %RedemptionStage::Validated, "Declared headers match ticket");

        let dest = self.resolver.resolve(&ticket.target_path)?;
        tracing::debug!(
            stage = %RedemptionStage::PathResolved,
            target_path = %dest,
            "Destination resolved"
        );

        if self
            .records
            .exists_for_path(dest.relative())
            .await
            .map_err(RedemptionError::internal(RedemptionStage::PathResolved))?
        {
            return Err(IngestError::DestinationOccupied(dest.relative().to_string()).into());
        }

        let report = self
            .engine
            .ingest(body, &dest, &expected, ticket.declared_size_bytes())
            .await?;
        tracing::debug!(
            stage = %RedemptionStage::Ingested,
            bytes = report.bytes,
            "Upload ingested"
        );

        // Commit on its own task so a disconnecting client cannot interrupt it
        // between the insert and the rollback.
        let coordinator = self.coordinator.clone();
        let commit_dest = dest.clone();
        let committed =
            match tokio::spawn(async move { coordinator.commit(&commit_dest, &report).await })
                .await
            {
                Ok(result) => result?,
                Err(e) => {
                    // The task died before its own rollback could run.
                    delete_logged(self.store.as_ref(), &dest).await;
                    return Err(RedemptionError::Internal {
                        stage: RedemptionStage::Ingested,
                        source: AppError::Internal(format!("commit task failed: {}", e)),
                    });
                }
            };

        tracing::info!(
            stage = %RedemptionStage::Committed,
            target_path = %dest,
            bytes = committed.size,
            file_id = %committed.record.id,
            "Upload ticket redeemed"
        );

        Ok(RedemptionReceipt::from_record(
            committed.record,
            committed.size,
            ticket.declared_content_type,
            committed.url,
        ))
    }
}
