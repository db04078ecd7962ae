//! API request and response types.

use serde::Serialize;
use utoipa::ToSchema;

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Destination used for outbound calls.
    pub destination: String,
    /// Whether the model provider service is registered.
    pub metadata_provider: bool,
    /// Timestamp.
    pub timestamp: String,
}
