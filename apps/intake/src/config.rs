use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "https://api.bey.dev/v1";
const DEFAULT_OUTPUT_DIR: &str = "call_outputs";

/// Application configuration loaded from environment variables.
/// Nothing is strictly required at startup: the API key is only needed by
/// code paths that talk to the remote calls API.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub output_dir: PathBuf,
    /// Shared secret expected in `x-webhook-secret`. `None` leaves the webhook open.
    pub webhook_secret: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_key: optional_env("BEY_API_KEY"),
            api_url: optional_env("BEY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            output_dir: optional_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            webhook_secret: optional_env("WEBHOOK_SECRET"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the API key or a descriptive error for entry points that cannot run without it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("Required environment variable 'BEY_API_KEY' is not set")
    }
}

/// Reads an env var, treating blank values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
impl Config {
    pub fn for_tests(output_dir: PathBuf) -> Self {
        Config {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            output_dir,
            webhook_secret: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
