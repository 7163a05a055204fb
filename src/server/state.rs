use std::sync::Arc;

use crate::config::ServerConfig;
use crate::embeddings::ModelHandle;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Resolved server configuration
    pub config: Arc<ServerConfig>,

    /// Lazily loaded model, shared across requests
    pub model: ModelHandle,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, model: ModelHandle) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}
