//! Read access to calls and transcripts on the avatar platform.
//!
//! Everything that needs call data goes through the `CallSource` trait so the
//! orchestrator and the HTTP handlers never talk to the platform directly.
//! `BeyClient` is the production implementation; tests swap in an in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::call::{Call, Message};

#[cfg(test)]
pub mod fake;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SourceError {
    /// Upstream status code, when the platform answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Api { status, .. } => Some(*status),
            SourceError::Http(e) => e.status().map(|s| s.as_u16()),
            SourceError::Parse(_) => None,
        }
    }
}

/// Read-only view of the platform's call records.
#[async_trait]
pub trait CallSource: Send + Sync {
    /// `GET /calls`: every call visible to the API key, without messages.
    async fn list_calls(&self) -> Result<Vec<Call>, SourceError>;

    /// `GET /calls/{id}/messages`: the transcript of one call, oldest first.
    async fn list_messages(&self, call_id: &str) -> Result<Vec<Message>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct CallList {
    #[serde(default)]
    data: Vec<Call>,
}

/// reqwest-backed `CallSource` authenticated with a static `x-api-key` header.
#[derive(Clone)]
pub struct BeyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BeyClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, SourceError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_text(&self, path: &str) -> Result<String, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl CallSource for BeyClient {
    async fn list_calls(&self) -> Result<Vec<Call>, SourceError> {
        let body = self.get_text("/calls").await?;
        let list: CallList = serde_json::from_str(&body)?;
        debug!("Fetched {} calls", list.data.len());
        Ok(list.data)
    }

    async fn list_messages(&self, call_id: &str) -> Result<Vec<Message>, SourceError> {
        let body = self.get_text(&format!("/calls/{call_id}/messages")).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
