//! Direct prediction without persisting a ticket.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    base::{error::TriageError, types::TriageResult},
    runtime::Runtime,
};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub confidence: f64,
}

/// Classifies `text` and reports the label with its rounded confidence.
#[instrument(skip_all)]
pub async fn predict(State(runtime): State<Runtime>, payload: Result<Json<PredictRequest>, JsonRejection>) -> TriageResult<Json<PredictResponse>> {
    let Json(request) = payload.map_err(TriageError::validation)?;

    if request.text.trim().is_empty() {
        return Err(TriageError::validation("text must not be empty"));
    }

    let triage = runtime.classifier.triage(&request.text, runtime.config.confidence_threshold)?;

    Ok(Json(PredictResponse {
        confidence: triage.reported_confidence(),
        label: triage.label,
    }))
}
