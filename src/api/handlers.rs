//! HTTP request handlers.

use axum::{body::Bytes, extract::State, Json};

use crate::api::types::HealthResponse;
use crate::domain::{now_timestamp, DecisionRequest, DecisionResult};
use crate::error::{RelayError, RelayResult};
use crate::AppState;

/// Approve or reject a workflow task on the remote system.
///
/// POST /odata/v4/approval/processWorkflowDecision
///
/// Always answers 200; success or failure is reported in the body. The body
/// is read as raw bytes so that a missing content type or an unreadable
/// payload still produces a result envelope.
#[utoipa::path(
    post,
    path = "/odata/v4/approval/processWorkflowDecision",
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision processed or rejected", body = DecisionResult),
        (status = 500, description = "Internal error")
    ),
    tag = "workflow"
)]
pub async fn process_workflow_decision(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<DecisionResult> {
    let request = DecisionRequest::from_body(&body);
    let result = state.relay.process_workflow_decision(request).await;

    tracing::info!(
        instance_id = %result.instance_id,
        decision = %result.decision,
        success = result.success,
        error = ?result.error,
        "Workflow decision processed"
    );

    Json(result)
}

/// Service model served by the metadata provider.
///
/// GET /odata/v4/approval/$metadata
#[utoipa::path(
    get,
    path = "/odata/v4/approval/$metadata",
    responses(
        (status = 200, description = "Service model"),
        (status = 404, description = "No metadata provider registered")
    ),
    tag = "workflow"
)]
pub async fn service_metadata(
    State(state): State<AppState>,
) -> RelayResult<Json<serde_json::Value>> {
    let provider = state
        .services
        .metadata_provider()
        .ok_or_else(|| RelayError::NotFound("Model provider service not registered".to_string()))?;

    Ok(Json(provider.service_model()))
}

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        destination: state.relay.destination_name().to_string(),
        metadata_provider: state.services.metadata_provider().is_some(),
        timestamp: now_timestamp(),
    })
}
