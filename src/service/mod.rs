//! Service integrations behind the HTTP layer.
//!
//! This module contains the two collaborators the API talks to:
//! - Classifiers (e.g., TF-IDF + logistic regression)
//! - Ticket stores (e.g., in-process, SurrealDB)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod classifier;
pub mod db;
