use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::storage::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Immutable tables plus the embedder, built once at startup.
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn DocumentStore>,
    pub config: Config,
}

impl AppState {
    /// Upper bound on one similarity computation.
    pub fn score_timeout(&self) -> Duration {
        Duration::from_secs(self.config.score_timeout_secs)
    }
}
