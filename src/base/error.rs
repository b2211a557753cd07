//! Domain error taxonomy surfaced to API callers.

use std::fmt::Display;

use thiserror::Error;

/// Errors produced by the triage pipeline and the ticket store.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The requested ticket does not exist.
    #[error("Ticket not found")]
    NotFound { id: i64 },
    /// The request was malformed or missing a required field.
    #[error("{0}")]
    Validation(String),
    /// Model artifacts are missing or corrupt.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// Scoring a message failed.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The ticket store could not complete the operation.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl TriageError {
    pub fn validation(err: impl Display) -> Self {
        Self::Validation(err.to_string())
    }

    pub fn model_unavailable(err: impl Display) -> Self {
        Self::ModelUnavailable(err.to_string())
    }

    pub fn inference(err: impl Display) -> Self {
        Self::Inference(err.to_string())
    }

    pub fn persistence(err: impl Display) -> Self {
        Self::Persistence(err.to_string())
    }
}
