//! One sequential pass over every call of an agent.
//!
//! Only the calls listing is fatal. A call whose messages cannot be fetched,
//! whose transcript holds no structured output, or whose output cannot be
//! written is reported and the pass moves on.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::bey_client::CallSource;
use crate::ingest::find_structured_output;
use crate::models::call::{full_transcript, Call};
use crate::store::OutputStore;

#[derive(Debug, Default)]
pub struct PollSummary {
    /// Calls owned by the target agent.
    pub matched: usize,
    pub saved: Vec<(String, PathBuf)>,
    /// Transcripts without structured output.
    pub missing_output: Vec<String>,
    /// Calls skipped because their messages or output could not be handled.
    pub failed: Vec<String>,
}

enum CallOutcome {
    Saved(PathBuf),
    NoOutput,
    Failed,
}

pub async fn run_poll(
    source: &dyn CallSource,
    store: &OutputStore,
    agent_id: &str,
) -> Result<PollSummary> {
    let calls = source
        .list_calls()
        .await
        .context("Error fetching calls")?;

    let mut summary = PollSummary::default();
    for mut call in calls.into_iter().filter(|c| c.agent_id == agent_id) {
        summary.matched += 1;
        match process_call(source, store, &mut call).await {
            CallOutcome::Saved(path) => summary.saved.push((call.id.clone(), path)),
            CallOutcome::NoOutput => summary.missing_output.push(call.id.clone()),
            CallOutcome::Failed => summary.failed.push(call.id.clone()),
        }
    }

    info!(
        "Poll finished for agent {agent_id}: {} calls, {} saved, {} without output, {} failed",
        summary.matched,
        summary.saved.len(),
        summary.missing_output.len(),
        summary.failed.len()
    );
    Ok(summary)
}

async fn process_call(
    source: &dyn CallSource,
    store: &OutputStore,
    call: &mut Call,
) -> CallOutcome {
    info!(
        call_id = %call.id,
        started_at = call.started_at.as_deref().unwrap_or("-"),
        ended_at = call.ended_at.as_deref().unwrap_or("-"),
        "Processing call"
    );

    call.messages = match source.list_messages(&call.id).await {
        Ok(messages) => messages,
        Err(e) => {
            error!("Error fetching messages for call {}: {e}", call.id);
            return CallOutcome::Failed;
        }
    };
    for m in &call.messages {
        debug!("[{}] {}: {}", m.sent_at, m.sender, m.message);
    }

    let Some(found) = find_structured_output(&call.messages) else {
        warn!(
            "No structured output for call {}. Transcript:\n{}",
            call.id,
            full_transcript(&call.messages)
        );
        return CallOutcome::NoOutput;
    };

    match store.save(&call.id, &found.output) {
        Ok(path) => CallOutcome::Saved(path),
        Err(e) => {
            error!("Failed to save output for call {}: {e}", call.id);
            CallOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bey_client::fake::{call, message, FakeSource};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_calls_list_failure_aborts_before_any_call() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let source = FakeSource::failing_list(500);

        let err = run_poll(&source, &store, "agent-1").await.unwrap_err();

        assert!(err.to_string().contains("Error fetching calls"));
        assert_eq!(source.message_fetches(), 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_process_call_attaches_fetched_messages() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let transcript = vec![
            message("user", "Hi"),
            message("assistant", "{\"role\": \"Recruiter\"}"),
        ];
        let source = FakeSource::new(Vec::new()).with_messages("c1", transcript.clone());
        let mut c1 = call("c1", "agent-1", Some("2025-01-01T00:10:00Z"));

        let outcome = process_call(&source, &store, &mut c1).await;

        assert!(matches!(outcome, CallOutcome::Saved(_)));
        assert_eq!(c1.messages, transcript);
    }

    #[tokio::test]
    async fn test_poll_filters_agent_and_isolates_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let source = FakeSource::new(vec![
            call("ok", "agent-1", Some("2025-01-01T00:10:00Z")),
            call("broken", "agent-1", Some("2025-01-01T00:20:00Z")),
            call("quiet", "agent-1", None),
            call("other", "agent-2", Some("2025-01-01T00:30:00Z")),
        ])
        .with_messages(
            "ok",
            vec![
                message("user", "I need a PM"),
                message("assistant", "```json\n{\"role\": \"PM\"}\n```"),
            ],
        )
        .with_failing_messages("broken", 502)
        .with_messages("quiet", vec![message("assistant", "Bye!")])
        .with_messages("other", vec![message("assistant", "{\"role\": \"x\"}")]);

        let summary = run_poll(&source, &store, "agent-1").await.unwrap();

        assert_eq!(summary.matched, 3);
        assert_eq!(source.message_fetches(), 3);
        assert_eq!(summary.saved.len(), 1);
        assert_eq!(summary.saved[0].0, "ok");
        assert_eq!(summary.missing_output, vec!["quiet".to_string()]);
        assert_eq!(summary.failed, vec!["broken".to_string()]);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.saved[0].1).unwrap()).unwrap();
        assert_eq!(written, json!({"role": "PM"}));
        assert!(!tmp.path().join("call_quiet_output.json").exists());
        assert!(!tmp.path().join("call_other_output.json").exists());
    }
}
