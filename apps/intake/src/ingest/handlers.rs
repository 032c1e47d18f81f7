//! Axum route handlers for call ingestion.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::ingest::latest::{fetch_latest_output, LatestOutput};
use crate::ingest::webhook::{process_event, verify_secret, WebhookResponse};
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Deserialize)]
pub struct FetchOutputRequest {
    #[serde(default, rename = "agentId", alias = "agent_id")]
    pub agent_id: Option<String>,
}

/// POST /webhook
///
/// Call events from the avatar platform. The body is read leniently: anything
/// that is not a JSON document is treated as an empty payload and ends up as
/// "no call id found".
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    verify_secret(state.config.webhook_secret.as_deref(), provided)?;

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    info!("Received webhook payload ({} bytes)", body.len());
    debug!("Webhook payload: {payload}");

    let response = process_event(&state, &payload).await?;
    Ok(Json(response))
}

/// POST /api/fetch-output
///
/// Finds the most recently ended call of `agentId` and returns (and saves)
/// its structured output.
///
/// The body is parsed by hand so that a missing content type or malformed
/// JSON still gets the usual `{ok: false, reason}` error body.
pub async fn handle_fetch_output(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LatestOutput>, AppError> {
    let request: FetchOutputRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("request body must be a JSON object: {e}")))?;
    let agent_id = request
        .agent_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("agentId required in body".to_string()))?;

    let latest = fetch_latest_output(state.source()?, &state.store, &agent_id).await?;
    Ok(Json(latest))
}
