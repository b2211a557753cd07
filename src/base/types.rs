use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TriageError;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Result type for operations that surface a [`TriageError`] to callers.
pub type TriageResult<T> = Result<T, TriageError>;

/// Status assigned to every freshly ingested ticket.
pub const DEFAULT_TICKET_STATUS: &str = "open";

/// A persisted, classified inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub sender: String,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// The write-once fields of a ticket, as handed to the store on ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub sender: String,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    /// Builds the stored ticket once the store has issued an id.
    pub fn into_ticket(self, id: i64) -> Ticket {
        Ticket {
            id,
            sender: self.sender,
            text: self.text,
            label: self.label,
            confidence: self.confidence,
            status: DEFAULT_TICKET_STATUS.to_string(),
            created_at: self.created_at,
            resolved_at: None,
        }
    }
}

/// Filters for listing tickets; every provided field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TicketFilter {
    pub label: Option<String>,
    pub status: Option<String>,
}

impl TicketFilter {
    /// Drops empty filter values so that `?label=` behaves like no filter at all.
    pub fn normalized(self) -> Self {
        Self {
            label: self.label.filter(|l| !l.is_empty()),
            status: self.status.filter(|s| !s.is_empty()),
        }
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.label.as_deref().is_none_or(|l| ticket.label == l) && self.status.as_deref().is_none_or(|s| ticket.status == s)
    }
}

/// A single class probability produced by a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScore {
    pub label: String,
    pub probability: f64,
}

impl ClassScore {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self { label: label.into(), probability }
    }
}

/// Outcome of the triage decision for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Triage {
    pub label: String,
    /// Maximum class probability, unrounded.
    pub confidence: f64,
    pub triage_required: bool,
}

impl Triage {
    /// Confidence rounded to three decimals for external reporting.
    pub fn reported_confidence(&self) -> f64 {
        round_confidence(self.confidence)
    }
}

/// Rounds a probability to three decimal places.
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 1000.0
}
