// Fetch a transcript, extract its structured output, save it.
// The polling pass lives in `poll`, the webhook path in `webhook`, and the
// latest-output lookup used by the web front end in `latest`.

pub mod handlers;
pub mod latest;
pub mod poll;
pub mod webhook;

use serde_json::Value;

use crate::extraction::extract;
use crate::models::call::{full_transcript, Message};

/// Structured output recovered from a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub output: Value,
    /// Index of the agent message that held the output; `None` when only the
    /// full-transcript pass succeeded.
    pub message_index: Option<usize>,
}

/// Newest agent-authored message first, one extractor run per message; if
/// none of them holds the output, one more run over the whole transcript.
pub fn find_structured_output(messages: &[Message]) -> Option<Found> {
    for (index, message) in messages.iter().enumerate().rev() {
        if !message.is_agent_authored() {
            continue;
        }
        if let Some(output) = extract(&message.message) {
            return Some(Found {
                output,
                message_index: Some(index),
            });
        }
    }

    extract(&full_transcript(messages)).map(|output| Found {
        output,
        message_index: None,
    })
}
