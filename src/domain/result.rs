//! Uniform result envelope returned by the decision relay.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ValidatedDecision;

/// Placeholder echoed for a missing `instanceId` or `decision`.
pub const NOT_AVAILABLE: &str = "N/A";

/// Failure classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input
    MissingParameters,
    InvalidDecision,
    // Token fetch
    DestinationAuthFailed,
    ServiceNotFound,
    AccessDenied,
    SystemError,
    CsrfError,
    // Decision submission
    InvalidParameters,
    InstanceNotFound,
    NotAuthorized,
    AlreadyProcessed,
    DecisionError,
    // Transport and fallback
    NotFound,
    ConnectionRefused,
    Timeout,
    UnexpectedError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::MissingParameters => "MISSING_PARAMETERS",
            ErrorCode::InvalidDecision => "INVALID_DECISION",
            ErrorCode::DestinationAuthFailed => "DESTINATION_AUTH_FAILED",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::SystemError => "SYSTEM_ERROR",
            ErrorCode::CsrfError => "CSRF_ERROR",
            ErrorCode::InvalidParameters => "INVALID_PARAMETERS",
            ErrorCode::InstanceNotFound => "INSTANCE_NOT_FOUND",
            ErrorCode::NotAuthorized => "NOT_AUTHORIZED",
            ErrorCode::AlreadyProcessed => "ALREADY_PROCESSED",
            ErrorCode::DecisionError => "DECISION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
        };
        f.write_str(code)
    }
}

/// Outcome of one `processWorkflowDecision` call.
///
/// `success` is true only when both the token fetch and the submission
/// succeeded; failures always carry `error` and never `decision_text`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub success: bool,
    pub message: String,
    pub instance_id: String,
    pub decision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// RFC 3339, millisecond precision, UTC.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    /// Upstream HTTP status, omitted when no response was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl DecisionResult {
    /// Successful submission.
    pub fn accepted(decision: &ValidatedDecision, http_status: u16) -> Self {
        Self {
            success: true,
            message: decision.decision.success_message().to_string(),
            instance_id: decision.instance_id.clone(),
            decision: decision.decision.code().to_string(),
            decision_text: Some(decision.decision.text().to_string()),
            comments: Some(decision.comments.clone()),
            timestamp: now_timestamp(),
            error: None,
            http_status: Some(http_status),
            details: None,
        }
    }

    /// Failed call. Missing identifiers are echoed as `N/A`.
    pub fn failed(
        instance_id: Option<&str>,
        decision: Option<&str>,
        error: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            instance_id: echo(instance_id),
            decision: echo(decision),
            decision_text: None,
            comments: None,
            timestamp: now_timestamp(),
            error: Some(error),
            http_status: None,
            details: None,
        }
    }

    pub fn with_http_status(mut self, status: Option<u16>) -> Self {
        self.http_status = status;
        self
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }
}

fn echo(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Current instant in the format used for every `timestamp` field.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
