//! Load configuration via `config` crate from the environment, overridden by an optional TOML file.

use std::{ops::Deref, path::PathBuf, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default socket address for the HTTP listener.
fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

/// Default location of the serialized TF-IDF vectorizer.
fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("models/vectorizer.json")
}

/// Default location of the serialized classifier.
fn default_model_path() -> PathBuf {
    PathBuf::from("models/model.json")
}

/// Confidence below which a message needs human review.
fn default_confidence_threshold() -> f64 {
    0.7
}

/// Default ticket store endpoint (process-local store).
fn default_db_endpoint() -> String {
    "memory".to_string()
}

fn default_db_namespace() -> String {
    "triage".to_string()
}

fn default_db_database() -> String {
    "tickets".to_string()
}

/// Configuration for the message-triage application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Socket address the HTTP server binds to (`BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Path to the vectorizer artifact (`VECTORIZER_PATH`).
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,
    /// Path to the classifier artifact (`MODEL_PATH`).
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Messages scored below this confidence are flagged for human review (`CONFIDENCE_THRESHOLD`).
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Ticket store endpoint (`DB_ENDPOINT`).
    ///
    /// `memory` selects the process-local store; anything else is handed to SurrealDB
    /// (e.g. `mem://` or `ws://localhost:8000`).
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Database username (`DB_USERNAME`).
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            vectorizer_path: default_vectorizer_path(),
            model_path: default_model_path(),
            confidence_threshold: default_confidence_threshold(),
            db_endpoint: default_db_endpoint(),
            db_namespace: default_db_namespace(),
            db_database: default_db_database(),
            db_username: None,
            db_password: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inner: Arc::new(ConfigInner::default()),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("MESSAGE_TRIAGE"));

        // The file, when present, takes precedence over the environment.
        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow::anyhow!("Confidence threshold must be between 0 and 1."));
        }

        if self.db_username.is_some() != self.db_password.is_some() {
            return Err(anyhow::anyhow!("Database username and password must be set together."));
        }

        Ok(())
    }
}

// Tests.
