//! HTTP interactions for the message-triage service.
//!
//! This module exposes the triage pipeline and the ticket store over HTTP:
//! - Health probe and direct prediction
//! - Message ingestion into tickets
//! - Ticket listing, lookup and resolution

pub mod health;
pub mod ingest;
pub mod predict;
pub mod tickets;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{base::error::TriageError, runtime::Runtime};

/// Build the HTTP router over the given runtime.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ml/predict", post(predict::predict))
        .route("/messages/ingest", post(ingest::ingest))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/:id", get(tickets::get_ticket).patch(tickets::resolve_ticket))
        .with_state(runtime)
        .layer(TraceLayer::new_for_http())
}

impl IntoResponse for TriageError {
    fn into_response(self) -> Response {
        let status = match &self {
            TriageError::NotFound { .. } => StatusCode::NOT_FOUND,
            TriageError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TriageError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TriageError::Inference(_) | TriageError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Renders a timestamp as RFC 3339 UTC with microseconds and a `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn serialize_timestamp<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

pub(crate) fn serialize_optional_timestamp<S: Serializer>(timestamp: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(timestamp) => serializer.serialize_str(&format_timestamp(timestamp)),
        None => serializer.serialize_none(),
    }
}
