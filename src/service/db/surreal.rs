//! SurrealDB implementation for ticket storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    error::TriageError,
    types::{NewTicket, Res, Ticket, TicketFilter, TriageResult},
};

use super::{GenericTicketStore, TicketStore};

// Extra methods on `TicketStore` applied by the surreal implementation.

impl TicketStore {
    /// Connects to the SurrealDB endpoint named in the configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let store = SurrealTicketStore::new(config).await?;
        Ok(Self { inner: Arc::new(store) })
    }

    /// Creates a store on an embedded, in-memory SurrealDB instance.
    pub async fn surreal_memory() -> Res<Self> {
        let store = SurrealTicketStore::connect("mem://", "triage", "tickets", None).await?;
        Ok(Self { inner: Arc::new(store) })
    }
}

// Records.

/// A ticket row as stored in the `ticket` table.
///
/// The SurrealDB record id mirrors `ticket_id` (`ticket:<id>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TicketRow {
    ticket_id: i64,
    sender: String,
    text: String,
    label: String,
    confidence: f64,
    status: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketRow {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.id,
            sender: ticket.sender,
            text: ticket.text,
            label: ticket.label,
            confidence: ticket.confidence,
            status: ticket.status,
            created_at: ticket.created_at,
            resolved_at: ticket.resolved_at,
        }
    }
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.ticket_id,
            sender: row.sender,
            text: row.text,
            label: row.label,
            confidence: row.confidence,
            status: row.status,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        }
    }
}

/// The id sequence record (`counter:ticket`).
#[derive(Debug, Deserialize)]
struct Counter {
    seq: i64,
}

// Specific implementations.

/// Ticket store backed by SurrealDB.
pub struct SurrealTicketStore {
    db: Surreal<Any>,
    /// Serializes id assignment and insertion within this process.
    create_lock: Mutex<()>,
}

impl SurrealTicketStore {
    /// Create a new store from the application configuration.
    #[instrument(name = "SurrealTicketStore::new", skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        let credentials = config.db_username.as_deref().zip(config.db_password.as_deref());

        Self::connect(&config.db_endpoint, &config.db_namespace, &config.db_database, credentials).await
    }

    /// Connect, authenticate when credentials are given, and define the schema.
    pub async fn connect(endpoint: &str, namespace: &str, database: &str, credentials: Option<(&str, &str)>) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        // Define schemas.

        db.query("DEFINE TABLE IF NOT EXISTS ticket SCHEMALESS;").await?.check()?;
        db.query("DEFINE INDEX IF NOT EXISTS ticket_id_unique ON TABLE ticket FIELDS ticket_id UNIQUE;").await?.check()?;
        db.query("DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;").await?.check()?;

        info!("Ticket database `{}/{}` initialized at `{}`.", namespace, database, endpoint);

        Ok(Self { db, create_lock: Mutex::new(()) })
    }

    /// Atomically bumps the ticket sequence and returns the new value.
    async fn next_id(&self) -> Res<i64> {
        let mut response = self.db.query("UPSERT ONLY counter:ticket SET seq = (seq OR 0) + 1;").await?.check()?;
        let counter: Option<Counter> = response.take(0)?;

        counter.map(|c| c.seq).ok_or_else(|| anyhow::anyhow!("ticket sequence did not return a value"))
    }

    async fn insert(&self, ticket: NewTicket) -> Res<Ticket> {
        let _guard = self.create_lock.lock().await;

        let id = self.next_id().await?;
        let row = TicketRow::from(ticket.into_ticket(id));

        let mut response = self
            .db
            .query("CREATE ONLY type::thing('ticket', $id) CONTENT $content;")
            .bind(("id", id))
            .bind(("content", row))
            .await?
            .check()?;
        let created: Option<TicketRow> = response.take(0)?;

        created.map(Ticket::from).ok_or_else(|| anyhow::anyhow!("ticket `{id}` was not returned after creation"))
    }

    async fn select(&self, filter: &TicketFilter) -> Res<Vec<Ticket>> {
        let mut conditions = Vec::new();

        if filter.label.is_some() {
            conditions.push("label = $label");
        }

        if filter.status.is_some() {
            conditions.push("status = $status");
        }

        let where_clause = if conditions.is_empty() { String::new() } else { format!(" WHERE {}", conditions.join(" AND ")) };

        let mut response = self
            .db
            .query(format!("SELECT * FROM ticket{where_clause} ORDER BY ticket_id ASC;"))
            .bind(("label", filter.label.clone()))
            .bind(("status", filter.status.clone()))
            .await?
            .check()?;
        let rows: Vec<TicketRow> = response.take(0)?;

        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    async fn find(&self, id: i64) -> Res<Option<Ticket>> {
        let mut response = self.db.query("SELECT * FROM ticket WHERE ticket_id = $id LIMIT 1;").bind(("id", id)).await?.check()?;
        let rows: Vec<TicketRow> = response.take(0)?;

        Ok(rows.into_iter().next().map(Ticket::from))
    }

    async fn set_status(&self, id: i64, status: &str, resolved_at: DateTime<Utc>) -> Res<Option<Ticket>> {
        let mut response = self
            .db
            .query("UPDATE ticket SET status = $status, resolved_at = $resolved_at WHERE ticket_id = $id RETURN AFTER;")
            .bind(("id", id))
            .bind(("status", status.to_string()))
            .bind(("resolved_at", resolved_at))
            .await?
            .check()?;
        let rows: Vec<TicketRow> = response.take(0)?;

        Ok(rows.into_iter().next().map(Ticket::from))
    }
}

#[async_trait]
impl GenericTicketStore for SurrealTicketStore {
    #[instrument(name = "SurrealTicketStore::create", skip_all)]
    async fn create(&self, ticket: NewTicket) -> TriageResult<Ticket> {
        let ticket = self.insert(ticket).await.map_err(TriageError::persistence)?;

        info!("Ticket `{}` created.", ticket.id);

        Ok(ticket)
    }

    #[instrument(name = "SurrealTicketStore::list", skip(self))]
    async fn list(&self, filter: &TicketFilter) -> TriageResult<Vec<Ticket>> {
        self.select(filter).await.map_err(TriageError::persistence)
    }

    #[instrument(name = "SurrealTicketStore::get", skip(self))]
    async fn get(&self, id: i64) -> TriageResult<Ticket> {
        self.find(id).await.map_err(TriageError::persistence)?.ok_or(TriageError::NotFound { id })
    }

    #[instrument(name = "SurrealTicketStore::update_status", skip(self))]
    async fn update_status(&self, id: i64, status: &str) -> TriageResult<Ticket> {
        let existing = self.get(id).await?;
        let resolved_at = Utc::now().max(existing.created_at);

        let ticket = self.set_status(id, status, resolved_at).await.map_err(TriageError::persistence)?.ok_or(TriageError::NotFound { id })?;

        info!("Ticket `{}` moved to `{}`.", id, status);

        Ok(ticket)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn new_ticket(sender: &str, label: &str) -> NewTicket {
        NewTicket {
            sender: sender.to_string(),
            text: format!("message from {sender}"),
            label: label.to_string(),
            confidence: 0.875,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = TicketStore::surreal_memory().await.unwrap();

        let created = store.create(new_ticket("alice", "booking")).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, "open");
        assert!(fetched.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_ids_increase_in_creation_order() {
        let store = TicketStore::surreal_memory().await.unwrap();

        let mut ids = Vec::new();
        for sender in ["alice", "bob", "carol"] {
            ids.push(store.create(new_ticket(sender, "booking")).await.unwrap().id);
        }

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        let store = TicketStore::surreal_memory().await.unwrap();

        let creates = (0..8).map(|i| {
            let store = store.clone();
            async move { store.create(new_ticket(&format!("sender-{i}"), "billing")).await.unwrap().id }
        });
        let mut ids = futures::future::join_all(creates).await;
        ids.sort();

        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = TicketStore::surreal_memory().await.unwrap();
        store.create(new_ticket("alice", "booking")).await.unwrap();
        let billing = store.create(new_ticket("bob", "billing")).await.unwrap();
        store.create(new_ticket("carol", "booking")).await.unwrap();
        store.update_status(billing.id, "closed").await.unwrap();

        let all = store.list(&TicketFilter::default()).await.unwrap();
        let booking = store.list(&TicketFilter { label: Some("booking".into()), status: None }).await.unwrap();
        let closed_billing = store
            .list(&TicketFilter {
                label: Some("billing".into()),
                status: Some("closed".into()),
            })
            .await
            .unwrap();

        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(booking.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(closed_billing.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn test_update_status_missing_id() {
        let store = TicketStore::surreal_memory().await.unwrap();

        let result = store.update_status(7, "closed").await;

        assert!(matches!(result, Err(TriageError::NotFound { id: 7 })));
        assert!(store.list(&TicketFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_stamps_resolved_at() {
        let store = TicketStore::surreal_memory().await.unwrap();
        let ticket = store.create(new_ticket("alice", "booking")).await.unwrap();

        store.update_status(ticket.id, "in_progress").await.unwrap();
        let resolved = store.update_status(ticket.id, "closed").await.unwrap();

        assert_eq!(resolved.status, "closed");
        assert!(resolved.resolved_at.unwrap() >= resolved.created_at);
        assert_eq!(store.get(ticket.id).await.unwrap().status, "closed");
    }
}
