//! Runtime services and shared state for the message-triage service.

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction,
    service::{classifier::ClassifierClient, db::TicketStore},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the ticket store, the classifier, and configuration.
/// It is designed to be trivially cloneable, allowing it to be handed to
/// every request handler without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The ticket store instance.
    pub store: TicketStore,
    /// The classifier instance.
    pub classifier: ClassifierClient,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Fails when the model artifacts cannot be loaded; the service must not
    /// serve traffic without them.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Load the model artifacts.
        let classifier = ClassifierClient::linear(&config)?;

        // Initialize the ticket store.
        let store = TicketStore::from_config(&config).await?;

        Ok(Self { config, store, classifier })
    }

    /// Build the HTTP router for this runtime.
    pub fn router(&self) -> Router {
        interaction::router(self.clone())
    }

    /// Serve HTTP until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.bind_address).await?;

        info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down ...");
            })
            .await?;

        Ok(())
    }
}
