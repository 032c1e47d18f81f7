pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ingest::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Call events from the avatar platform
        .route("/webhook", post(handlers::handle_webhook))
        // Latest structured output for the web front end
        .route("/api/fetch-output", post(handlers::handle_fetch_output))
        .with_state(state)
}
