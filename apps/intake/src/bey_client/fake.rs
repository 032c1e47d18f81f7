//! In-memory `CallSource` for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{CallSource, SourceError};
use crate::models::call::{Call, Message};

pub struct FakeSource {
    /// `Err(status)` makes `list_calls` fail with that status.
    calls: Result<Vec<Call>, u16>,
    messages: HashMap<String, Result<Vec<Message>, u16>>,
    message_fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(calls: Vec<Call>) -> Self {
        Self {
            calls: Ok(calls),
            messages: HashMap::new(),
            message_fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing_list(status: u16) -> Self {
        Self {
            calls: Err(status),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_messages(mut self, call_id: &str, messages: Vec<Message>) -> Self {
        self.messages.insert(call_id.to_string(), Ok(messages));
        self
    }

    pub fn with_failing_messages(mut self, call_id: &str, status: u16) -> Self {
        self.messages.insert(call_id.to_string(), Err(status));
        self
    }

    pub fn message_fetches(&self) -> usize {
        self.message_fetches.load(Ordering::SeqCst)
    }
}

fn api_error(status: u16) -> SourceError {
    SourceError::Api {
        status,
        body: "fake upstream failure".to_string(),
    }
}

#[async_trait]
impl CallSource for FakeSource {
    async fn list_calls(&self) -> Result<Vec<Call>, SourceError> {
        self.calls.clone().map_err(api_error)
    }

    async fn list_messages(&self, call_id: &str) -> Result<Vec<Message>, SourceError> {
        self.message_fetches.fetch_add(1, Ordering::SeqCst);
        match self.messages.get(call_id) {
            Some(result) => result.clone().map_err(api_error),
            None => Err(api_error(404)),
        }
    }
}

pub fn call(id: &str, agent_id: &str, ended_at: Option<&str>) -> Call {
    Call {
        id: id.to_string(),
        agent_id: agent_id.to_string(),
        started_at: Some("2025-01-01T00:00:00Z".to_string()),
        ended_at: ended_at.map(String::from),
        messages: Vec::new(),
    }
}

pub fn message(sender: &str, text: &str) -> Message {
    Message {
        sender: sender.to_string(),
        sent_at: "2025-01-01T00:00:00Z".to_string(),
        message: text.to_string(),
    }
}
