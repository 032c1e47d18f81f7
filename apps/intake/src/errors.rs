use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::bey_client::SourceError;
use crate::models::call::Message;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every error body has the shape `{"ok": false, "reason": ..., ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no call id found in payload")]
    MissingCallId,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("no structured JSON found in messages")]
    NoStructuredOutput { messages: Vec<Message> },

    #[error("missing BEY_API_KEY on server")]
    MissingCredentials,

    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn upstream(context: &'static str, source: SourceError) -> Self {
        AppError::Upstream { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason, extra) = match &self {
            AppError::MissingCallId => (StatusCode::BAD_REQUEST, self.to_string(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "invalid or missing webhook secret".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::NoStructuredOutput { messages } => (
                StatusCode::NOT_FOUND,
                self.to_string(),
                Some(("messages", json!(messages))),
            ),
            AppError::MissingCredentials => {
                tracing::error!("Remote fetch required but BEY_API_KEY is not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            AppError::Upstream { context, source } => {
                tracing::error!("Upstream error ({context}): {source}");
                (
                    StatusCode::BAD_GATEWAY,
                    context.to_string(),
                    source.status().map(|s| ("status", json!(s))),
                )
            }
            AppError::Store(StoreError::InvalidCallId(id)) => (
                StatusCode::BAD_REQUEST,
                format!("invalid call id '{id}'"),
                None,
            ),
            AppError::Store(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to save output".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "ok": false,
            "reason": reason,
        });
        if let (Some((key, value)), Value::Object(map)) = (extra, &mut body) {
            map.insert(key.to_string(), value);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_call_id_is_bad_request() {
        let (status, body) = body_of(AppError::MissingCallId).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"ok": false, "reason": "no call id found in payload"})
        );
    }

    #[tokio::test]
    async fn test_upstream_carries_status() {
        let err = AppError::upstream(
            "failed fetching messages",
            SourceError::Api {
                status: 503,
                body: "unavailable".to_string(),
            },
        );
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["reason"], "failed fetching messages");
        assert_eq!(body["status"], 503);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_server_error() {
        let (status, body) = body_of(AppError::MissingCredentials).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_invalid_call_id_is_client_error() {
        let err = AppError::Store(StoreError::InvalidCallId("../x".to_string()));
        let (status, _) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
