//! Library root for `message-triage`.
//!
//! Message-triage classifies inbound customer messages into intent labels and
//! turns them into tickets:
//! - Scores each message with a pretrained TF-IDF + logistic regression model
//! - Flags low-confidence classifications for human review
//! - Stores tickets and lets clients list, inspect and resolve them
//!
//! The classifier and the ticket store sit behind traits so that different
//! models and storage backends can be swapped in, and so tests can inject fakes.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the HTTP server:
/// - Loads the model artifacts (fatal on failure)
/// - Opens the ticket store
/// - Serves the API until Ctrl-C
pub async fn start(config: Config) -> Void {
    info!("Starting message-triage ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
