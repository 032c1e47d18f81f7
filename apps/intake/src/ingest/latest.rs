//! Latest-output lookup for the web front end: the most recently ended call
//! of an agent, searched message by message.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::bey_client::CallSource;
use crate::errors::AppError;
use crate::ingest::find_structured_output;
use crate::store::OutputStore;

#[derive(Debug, Serialize)]
pub struct LatestOutput {
    pub ok: bool,
    pub call_id: String,
    pub output: Value,
    pub saved: String,
}

pub async fn fetch_latest_output(
    source: &dyn CallSource,
    store: &OutputStore,
    agent_id: &str,
) -> Result<LatestOutput, AppError> {
    let calls = source
        .list_calls()
        .await
        .map_err(|e| AppError::upstream("failed fetching calls", e))?;

    let mut call = calls
        .into_iter()
        .filter(|c| c.agent_id == agent_id && c.ended_at.is_some())
        .max_by_key(|c| c.ended_at_utc())
        .ok_or_else(|| AppError::NotFound("no ended calls found for agent".to_string()))?;

    call.messages = source
        .list_messages(&call.id)
        .await
        .map_err(|e| AppError::upstream("failed fetching messages", e))?;

    let Some(found) = find_structured_output(&call.messages) else {
        return Err(AppError::NoStructuredOutput {
            messages: call.messages,
        });
    };
    info!(
        "Latest output for agent {agent_id} taken from call {} (message {:?})",
        call.id, found.message_index
    );

    let saved = store.save(&call.id, &found.output)?;
    Ok(LatestOutput {
        ok: true,
        call_id: call.id,
        output: found.output,
        saved: saved.display().to_string(),
    })
}
