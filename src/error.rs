//! Error types for the workflow relay.
//!
//! Business failures of a decision are never errors (they are
//! `DecisionResult` values). These types cover startup, wiring and the
//! shell's own responses.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::catch_panic::ResponseForPanic;

use crate::config::DeploymentMode;
use crate::remote::TransportError;

/// Unified error type for relay startup and shell operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                details,
            },
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            _ => {
                // Log the actual error but don't expose internals
                tracing::error!(error = %self, "Server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message, None))).into_response()
    }
}

/// Catch-all for panics raised while handling a request.
///
/// Answers with a generic 500; the panic message is included only in
/// development.
#[derive(Debug, Clone, Copy)]
pub struct PanicHandler {
    mode: DeploymentMode,
}

impl PanicHandler {
    pub fn new(mode: DeploymentMode) -> Self {
        Self { mode }
    }
}

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "unknown panic".to_string()
        };

        tracing::error!(error = %detail, "Server Error");

        let details = self.mode.exposes_error_details().then_some(detail);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Internal Server Error", details)),
        )
            .into_response()
    }
}

/// Result type alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_panic_details_only_in_development() {
        let mut dev = PanicHandler::new(DeploymentMode::Development);
        let response = dev.response_for_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert_eq!(body["error"]["details"], "boom");

        let mut prod = PanicHandler::new(DeploymentMode::Production);
        let body = body_json(prod.response_for_panic(Box::new(String::from("boom")))).await;
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_cause() {
        let err = RelayError::Transport(TransportError::request("tls handshake"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal Server Error");

        let response = RelayError::NotFound("gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
