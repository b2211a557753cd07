//! Process-local ticket store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::base::{
    error::TriageError,
    types::{NewTicket, Ticket, TicketFilter, TriageResult},
};

use super::{GenericTicketStore, TicketStore};

// Extra methods on `TicketStore` applied by the memory implementation.

impl TicketStore {
    /// Creates an empty, process-local ticket store.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(MemoryTicketStore::default()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    tickets: Vec<Ticket>,
}

/// Ticket store that keeps everything in a lock-protected vector.
///
/// Tickets are appended in id order, so listing preserves insertion order.
#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    state: RwLock<MemoryState>,
}

#[async_trait]
impl GenericTicketStore for MemoryTicketStore {
    #[instrument(name = "MemoryTicketStore::create", skip_all)]
    async fn create(&self, ticket: NewTicket) -> TriageResult<Ticket> {
        let mut state = self.state.write().await;

        state.last_id += 1;
        let ticket = ticket.into_ticket(state.last_id);
        state.tickets.push(ticket.clone());

        info!("Ticket `{}` created.", ticket.id);

        Ok(ticket)
    }

    #[instrument(name = "MemoryTicketStore::list", skip(self))]
    async fn list(&self, filter: &TicketFilter) -> TriageResult<Vec<Ticket>> {
        let state = self.state.read().await;

        Ok(state.tickets.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    #[instrument(name = "MemoryTicketStore::get", skip(self))]
    async fn get(&self, id: i64) -> TriageResult<Ticket> {
        let state = self.state.read().await;

        state.tickets.iter().find(|t| t.id == id).cloned().ok_or(TriageError::NotFound { id })
    }

    #[instrument(name = "MemoryTicketStore::update_status", skip(self))]
    async fn update_status(&self, id: i64, status: &str) -> TriageResult<Ticket> {
        let mut state = self.state.write().await;

        let ticket = state.tickets.iter_mut().find(|t| t.id == id).ok_or(TriageError::NotFound { id })?;

        ticket.status = status.to_string();
        ticket.resolved_at = Some(Utc::now().max(ticket.created_at));

        info!("Ticket `{}` moved to `{}`.", id, status);

        Ok(ticket.clone())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn new_ticket(sender: &str, label: &str) -> NewTicket {
        NewTicket {
            sender: sender.to_string(),
            text: format!("message from {sender}"),
            label: label.to_string(),
            confidence: 0.9,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = TicketStore::memory();

        let first = store.create(new_ticket("alice", "booking")).await.unwrap();
        let second = store.create(new_ticket("bob", "billing")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, "open");
        assert!(first.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        let store = TicketStore::memory();

        let creates = (0..32).map(|i| {
            let store = store.clone();
            async move { store.create(new_ticket(&format!("sender-{i}"), "booking")).await.unwrap().id }
        });
        let mut ids = futures::future::join_all(creates).await;
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn test_list_filters_intersect() {
        let store = TicketStore::memory();
        store.create(new_ticket("alice", "booking")).await.unwrap();
        let billing = store.create(new_ticket("bob", "billing")).await.unwrap();
        store.create(new_ticket("carol", "booking")).await.unwrap();
        store.update_status(billing.id, "closed").await.unwrap();

        let all = store.list(&TicketFilter::default()).await.unwrap();
        let booking = store.list(&TicketFilter { label: Some("booking".into()), status: None }).await.unwrap();
        let closed_booking = store
            .list(&TicketFilter {
                label: Some("booking".into()),
                status: Some("closed".into()),
            })
            .await
            .unwrap();

        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(booking.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(closed_booking.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_missing_id_changes_nothing() {
        let store = TicketStore::memory();
        store.create(new_ticket("alice", "booking")).await.unwrap();

        let result = store.update_status(42, "closed").await;

        assert!(matches!(result, Err(TriageError::NotFound { id: 42 })));
        assert_eq!(store.get(1).await.unwrap().status, "open");
    }

    #[tokio::test]
    async fn test_update_status_twice_keeps_latest() {
        let store = TicketStore::memory();
        let ticket = store.create(new_ticket("alice", "booking")).await.unwrap();

        let first = store.update_status(ticket.id, "in_progress").await.unwrap();
        let second = store.update_status(ticket.id, "closed").await.unwrap();

        assert_eq!(second.status, "closed");
        assert!(second.resolved_at.unwrap() >= first.resolved_at.unwrap());
        assert!(second.resolved_at.unwrap() >= second.created_at);
        assert_eq!(store.get(ticket.id).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_resolved_at_never_precedes_created_at() {
        let store = TicketStore::memory();
        let mut ticket = new_ticket("alice", "booking");
        ticket.created_at = Utc::now() + Duration::hours(1);
        let ticket = store.create(ticket).await.unwrap();

        let resolved = store.update_status(ticket.id, "closed").await.unwrap();

        assert_eq!(resolved.resolved_at, Some(ticket.created_at));
    }
}
