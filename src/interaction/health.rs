//! Liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe; touches nothing.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
