//! Ticket listing, lookup and resolution.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    base::{
        error::TriageError,
        types::{Ticket, TicketFilter, TriageResult, round_confidence},
    },
    runtime::Runtime,
};

use super::{serialize_optional_timestamp, serialize_timestamp};

/// Reduced projection used by the listing endpoint.
#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub id: i64,
    #[serde(rename = "from")]
    pub sender: String,
    pub label: String,
    pub status: String,
}

impl From<Ticket> for TicketSummary {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            sender: ticket.sender,
            label: ticket.label,
            status: ticket.status,
        }
    }
}

/// Stored ticket including its resolution timestamp.
#[derive(Debug, Serialize)]
pub struct TicketDetail {
    pub id: i64,
    #[serde(rename = "from")]
    pub sender: String,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub status: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketDetail {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            sender: ticket.sender,
            text: ticket.text,
            label: ticket.label,
            confidence: round_confidence(ticket.confidence),
            status: ticket.status,
            created_at: ticket.created_at,
            resolved_at: ticket.resolved_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ResolutionView {
    pub id: i64,
    pub status: String,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Lists tickets, optionally filtered by `label` and `status`.
#[instrument(skip_all)]
pub async fn list_tickets(State(runtime): State<Runtime>, query: Result<Query<TicketFilter>, QueryRejection>) -> TriageResult<Json<Vec<TicketSummary>>> {
    let Query(filter) = query.map_err(TriageError::validation)?;

    let tickets = runtime.store.list(&filter.normalized()).await?;

    Ok(Json(tickets.into_iter().map(TicketSummary::from).collect()))
}

/// Fetches one ticket by id.
#[instrument(skip_all)]
pub async fn get_ticket(State(runtime): State<Runtime>, id: Result<Path<i64>, PathRejection>) -> TriageResult<Json<TicketDetail>> {
    let Path(id) = id.map_err(TriageError::validation)?;

    let ticket = runtime.store.get(id).await?;

    Ok(Json(TicketDetail::from(ticket)))
}

/// Sets a new status on a ticket and stamps its resolution time.
#[instrument(skip_all)]
pub async fn resolve_ticket(
    State(runtime): State<Runtime>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> TriageResult<Json<ResolutionView>> {
    let Path(id) = id.map_err(TriageError::validation)?;
    let Json(request) = payload.map_err(TriageError::validation)?;

    if request.status.trim().is_empty() {
        return Err(TriageError::validation("status must not be empty"));
    }

    let ticket = runtime.store.update_status(id, &request.status).await?;

    Ok(Json(ResolutionView {
        id: ticket.id,
        status: ticket.status,
        resolved_at: ticket.resolved_at,
    }))
}
