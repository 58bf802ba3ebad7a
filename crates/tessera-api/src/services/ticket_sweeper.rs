//! Background purge of expired upload tickets.
//!
//! Expired tickets are already unredeemable; purging only reclaims space, so a
//! failed sweep is logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tessera_db::TicketStore;

/// Delete expired tickets once. Returns how many were removed.
pub async fn sweep_once(tickets: &dyn TicketStore) -> u64 {
    match tickets.purge_expired(Utc::now()).await {
        Ok(0) => {
            tracing::debug!("No expired upload tickets to purge");
            0
        }
        Ok(purged) => {
            tracing::info!(purged, "Purged expired upload tickets");
            purged
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to purge expired upload tickets");
            0
        }
    }
}

/// Start the periodic sweep. `interval_secs == 0` disables it.
pub fn start_ticket_sweeper(
    tickets: Arc<dyn TicketStore>,
    interval_secs: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Expired ticket sweeper disabled");
        return None;
    }

    tracing::info!(interval_secs, "Starting expired ticket sweeper");
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            sweep_once(tickets.as_ref()).await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::models::NewUploadTicket;
    use tessera_db::InMemoryTicketStore;

    const HELLO_B64: &str = "XrY7u+Ae7tCTyyK7j1rNww==";

    async fn issue(store: &InMemoryTicketStore, id: &str, ttl: chrono::Duration) {
        store
            .create(NewUploadTicket::new(
                id,
                format!("docs/{}.txt", id),
                "text/plain",
                11,
                HELLO_B64,
                ttl,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_tickets() {
        let store = InMemoryTicketStore::new();
        issue(&store, "live", chrono::Duration::hours(1)).await;
        issue(&store, "stale", chrono::Duration::milliseconds(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(sweep_once(&store).await, 1);
        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_interval_disables_sweeper() {
        let store: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());
        assert!(start_ticket_sweeper(store, 0).is_none());
    }
}
