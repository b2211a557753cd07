//! Ticket persistence.
//!
//! The `GenericTicketStore` trait is the repository interface the API layer
//! talks to. Two backends ship with the service: a process-local store and a
//! SurrealDB-backed store.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::instrument;

use crate::base::{
    config::Config,
    types::{NewTicket, Res, Ticket, TicketFilter, TriageResult},
};

pub mod memory;
pub mod surreal;

// Traits.

/// Generic ticket store trait that backends must implement.
///
/// Implementations must be safe to share between concurrently running
/// request handlers.
#[async_trait]
pub trait GenericTicketStore: Send + Sync + 'static {
    /// Persists a new ticket and returns it with its freshly issued id.
    ///
    /// The ticket starts out `open` and unresolved. Ids are unique and
    /// increase with creation order, even under concurrent creates.
    async fn create(&self, ticket: NewTicket) -> TriageResult<Ticket>;

    /// Lists tickets matching every provided filter, ordered by id.
    async fn list(&self, filter: &TicketFilter) -> TriageResult<Vec<Ticket>>;

    /// Gets a single ticket by id.
    async fn get(&self, id: i64) -> TriageResult<Ticket>;

    /// Sets the ticket status and stamps `resolved_at` with the current time.
    ///
    /// Fails with `NotFound` (and changes nothing) when the id is unknown.
    async fn update_status(&self, id: i64, status: &str) -> TriageResult<Ticket>;
}

// Structs.

/// Ticket store for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TicketStore {
    inner: Arc<dyn GenericTicketStore>,
}

impl Deref for TicketStore {
    type Target = dyn GenericTicketStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TicketStore {
    pub fn new(inner: Arc<dyn GenericTicketStore>) -> Self {
        Self { inner }
    }

    /// Opens the backend selected by `db_endpoint`.
    #[instrument(name = "TicketStore::from_config", skip_all, fields(endpoint = %config.db_endpoint))]
    pub async fn from_config(config: &Config) -> Res<Self> {
        if config.db_endpoint == "memory" {
            Ok(Self::memory())
        } else {
            Self::surreal(config).await
        }
    }
}
