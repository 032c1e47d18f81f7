use std::sync::Arc;

use crate::bey_client::CallSource;
use crate::config::Config;
use crate::errors::AppError;
use crate::store::OutputStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Remote call source. `None` when no API key is configured; handlers
    /// that need a fetch answer with `AppError::MissingCredentials`.
    pub source: Option<Arc<dyn CallSource>>,
    pub store: OutputStore,
    pub config: Config,
}

impl AppState {
    pub fn source(&self) -> Result<&dyn CallSource, AppError> {
        self.source.as_deref().ok_or(AppError::MissingCredentials)
    }
}
