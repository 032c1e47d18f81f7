//! Webhook processing: one inbound call event becomes one saved output file.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract;
use crate::models::call::{full_transcript, Message};
use crate::state::AppState;

/// Places a call id may sit in an event payload, probed in order.
const CALL_ID_PROBES: &[&str] = &["/call_id", "/data/id", "/call/id", "/event/call_id"];

pub const NO_JSON_REASON: &str = "no JSON block found in messages";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookResponse {
    fn saved(path: String) -> Self {
        Self {
            ok: true,
            saved: Some(path),
            reason: None,
        }
    }

    /// A miss is still a 200 so the sender doesn't keep retrying.
    fn no_output() -> Self {
        Self {
            ok: false,
            saved: None,
            reason: Some(NO_JSON_REASON.to_string()),
        }
    }
}

/// First non-empty string or numeric id found by `CALL_ID_PROBES`.
pub fn resolve_call_id(payload: &Value) -> Option<String> {
    CALL_ID_PROBES
        .iter()
        .filter_map(|probe| payload.pointer(probe))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Messages embedded in the event, if any. A present but malformed
/// `messages` field is a client error rather than a reason to fetch.
pub fn inline_messages(payload: &Value) -> Result<Option<Vec<Message>>, AppError> {
    match payload.get("messages") {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => serde_json::from_value(raw.clone()).map(Some).map_err(|e| {
            AppError::Validation(format!("messages must be an array of message objects: {e}"))
        }),
    }
}

/// Compares the configured webhook secret with the one the sender supplied.
/// With no secret configured every request is accepted.
pub fn verify_secret(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match provided {
        Some(provided) if constant_time_eq(expected.as_bytes(), provided.as_bytes()) => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Resolves the call, gathers its transcript, runs the extractor once over
/// the whole transcript and saves the result.
pub async fn process_event(state: &AppState, payload: &Value) -> Result<WebhookResponse, AppError> {
    let call_id = resolve_call_id(payload).ok_or(AppError::MissingCallId)?;
    // reject unusable ids before doing any remote work
    state.store.path_for(&call_id)?;

    let messages = match inline_messages(payload)? {
        Some(messages) => messages,
        None => state
            .source()?
            .list_messages(&call_id)
            .await
            .map_err(|e| AppError::upstream("failed fetching messages", e))?,
    };

    let Some(output) = extract(&full_transcript(&messages)) else {
        info!("No JSON block found for call {call_id}");
        return Ok(WebhookResponse::no_output());
    };

    let path = state.store.save(&call_id, &output)?;
    Ok(WebhookResponse::saved(path.display().to_string()))
}
