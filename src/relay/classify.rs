//! Error classification - maps observed HTTP statuses and transport failures
//! to error codes and user-facing messages.
//!
//! Each phase has its own table because the same status means different
//! things before and after the token is acquired (a 404 on the token fetch
//! is a missing service, on the submission a missing instance).

use crate::domain::ErrorCode;
use crate::remote::TransportError;

/// An error code with the message shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub code: ErrorCode,
    pub message: &'static str,
}

impl Classification {
    const fn new(code: ErrorCode, message: &'static str) -> Self {
        Self { code, message }
    }
}

/// Token fetch failed or returned no token.
pub fn classify_token_failure(status: Option<u16>) -> Classification {
    match status {
        Some(401) => Classification::new(
            ErrorCode::DestinationAuthFailed,
            "Destination authentication failed. Please check destination configuration.",
        ),
        Some(404) => Classification::new(
            ErrorCode::ServiceNotFound,
            "TaskProcessing service not found. Please check if the service is activated in S/4HANA.",
        ),
        Some(403) => Classification::new(
            ErrorCode::AccessDenied,
            "Access denied. Destination may not have sufficient authorization.",
        ),
        Some(s) if s >= 500 => Classification::new(
            ErrorCode::SystemError,
            "S/4HANA system error. Please try again later.",
        ),
        _ => Classification::new(ErrorCode::CsrfError, "Failed to connect to S/4HANA system"),
    }
}

/// Decision submission answered with a non-success status.
pub fn classify_submission_failure(status: u16) -> Classification {
    match status {
        400 => Classification::new(
            ErrorCode::InvalidParameters,
            "Invalid workflow instance or decision parameters. The workflow may have already been processed.",
        ),
        404 => Classification::new(
            ErrorCode::InstanceNotFound,
            "Workflow instance not found or no longer available for processing.",
        ),
        403 => Classification::new(
            ErrorCode::NotAuthorized,
            "You are not authorized to process this workflow instance.",
        ),
        409 => Classification::new(
            ErrorCode::AlreadyProcessed,
            "Workflow instance has already been processed by another user.",
        ),
        s if s >= 500 => Classification::new(
            ErrorCode::SystemError,
            "S/4HANA system error during workflow processing. Please try again later.",
        ),
        _ => Classification::new(ErrorCode::DecisionError, "Failed to process workflow decision"),
    }
}

/// No response was obtained in either phase.
///
/// A status attached to the failure wins over the failure kind.
pub fn classify_transport_failure(error: &TransportError) -> Classification {
    match (error.status(), error) {
        (Some(401), _) => Classification::new(
            ErrorCode::DestinationAuthFailed,
            "Destination authentication failed",
        ),
        (Some(404), _) => Classification::new(
            ErrorCode::NotFound,
            "Workflow service or instance not found",
        ),
        (Some(403), _) => Classification::new(
            ErrorCode::AccessDenied,
            "Access denied for this workflow instance",
        ),
        (_, TransportError::ConnectionRefused(_)) => Classification::new(
            ErrorCode::ConnectionRefused,
            "Cannot connect to S/4HANA system. Please check system availability.",
        ),
        (_, TransportError::Timeout(_)) => Classification::new(
            ErrorCode::Timeout,
            "Request timeout. S/4HANA system may be slow or unavailable.",
        ),
        _ => Classification::new(
            ErrorCode::UnexpectedError,
            "An unexpected error occurred while processing the workflow decision",
        ),
    }
}
