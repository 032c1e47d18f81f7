use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender tags the avatar service uses for agent-authored turns.
const AGENT_SENDERS: &[&str] = &["assistant", "ai", "bot"];

/// One conversational session, as listed by `GET /calls`.
/// `messages` is empty on list responses and filled by the per-call fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl Call {
    /// Parsed end time. `None` while the call is still running or when the
    /// upstream timestamp is in a format we don't recognise.
    pub fn ended_at_utc(&self) -> Option<DateTime<Utc>> {
        self.ended_at.as_deref().and_then(parse_timestamp)
    }
}

/// One transcript turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub sent_at: String,
    #[serde(default)]
    pub message: String,
}

impl Message {
    pub fn is_agent_authored(&self) -> bool {
        let sender = self.sender.trim();
        AGENT_SENDERS.iter().any(|s| s.eq_ignore_ascii_case(sender))
    }
}

/// Joins every message in chronological order, separated by blank lines.
pub fn full_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.message.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Accepts RFC 3339 and the zone-less ISO form some endpoints emit (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
