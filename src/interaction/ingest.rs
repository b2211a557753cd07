//! Message ingestion: classify, then persist as a ticket.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    base::{
        error::TriageError,
        types::{NewTicket, Ticket, Triage, TriageResult, round_confidence},
    },
    runtime::Runtime,
};

use super::serialize_timestamp;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(rename = "from")]
    pub sender: String,
    pub text: String,
}

/// The full ticket as returned right after ingestion.
#[derive(Debug, Serialize)]
pub struct TicketView {
    pub id: i64,
    #[serde(rename = "from")]
    pub sender: String,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub status: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub triage_required: bool,
}

impl TicketView {
    pub fn new(ticket: Ticket, triage_required: bool) -> Self {
        Self {
            id: ticket.id,
            sender: ticket.sender,
            text: ticket.text,
            label: ticket.label,
            confidence: round_confidence(ticket.confidence),
            status: ticket.status,
            created_at: ticket.created_at,
            triage_required,
        }
    }
}

/// Triage the message and store it; nothing is stored when scoring fails.
#[instrument(skip_all)]
pub async fn ingest(State(runtime): State<Runtime>, payload: Result<Json<IngestRequest>, JsonRejection>) -> TriageResult<Json<TicketView>> {
    let Json(request) = payload.map_err(TriageError::validation)?;

    if request.text.trim().is_empty() {
        return Err(TriageError::validation("text must not be empty"));
    }

    let Triage { label, confidence, triage_required } = runtime.classifier.triage(&request.text, runtime.config.confidence_threshold)?;

    let ticket = runtime
        .store
        .create(NewTicket {
            sender: request.sender,
            text: request.text,
            label,
            confidence,
            created_at: Utc::now(),
        })
        .await?;

    info!("Ingested message from `{}` as ticket `{}` (`{}`, triage required: {}).", ticket.sender, ticket.id, ticket.label, triage_required);

    Ok(Json(TicketView::new(ticket, triage_required)))
}
