//! Decision Relay - validates a decision and forwards it to the remote
//! task-processing service in two phases.
//!
//! Phase one fetches an anti-forgery token (and the session cookies that go
//! with it); phase two posts the decision presenting that token. Every
//! outcome, including transport failures, is returned as a
//! [`DecisionResult`]; nothing here returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::domain::{
    DecisionCode, DecisionRequest, DecisionResult, ErrorCode, ValidatedDecision,
};
use crate::relay::{
    decision_url, response_details, RelayFailure, SubmissionAccepted, TokenAcquired, CSRF_HEADER,
};
use crate::remote::{
    Destination, DestinationResolver, HttpTransport, OutboundRequest, OutboundResponse,
    TransportError,
};

/// Static settings for every invocation.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub destination: String,
    pub service_path: String,
    /// Bound on each outbound call.
    pub timeout: Duration,
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            destination: config.destination.clone(),
            service_path: config.service_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Relays workflow decisions to the remote system.
///
/// Holds no per-call state; concurrent invocations are independent.
pub struct DecisionRelay {
    resolver: Arc<dyn DestinationResolver>,
    transport: Arc<dyn HttpTransport>,
    settings: RelaySettings,
}

impl DecisionRelay {
    pub fn new(
        resolver: Arc<dyn DestinationResolver>,
        transport: Arc<dyn HttpTransport>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            resolver,
            transport,
            settings,
        }
    }

    pub fn destination_name(&self) -> &str {
        &self.settings.destination
    }

    /// Process one approve/reject decision.
    pub async fn process_workflow_decision(&self, request: DecisionRequest) -> DecisionResult {
        let span = tracing::info_span!(
            "workflow_decision",
            correlation_id = %Uuid::new_v4(),
            instance_id = request.instance_id.as_deref().unwrap_or_default(),
            decision = request.decision.as_deref().unwrap_or_default(),
        );

        async move {
            let decision = match validate(&request) {
                Ok(decision) => decision,
                Err(rejected) => return rejected,
            };

            match self.relay(&decision).await {
                Ok(accepted) => {
                    tracing::info!(
                        http_status = accepted.status,
                        decision_text = decision.decision.text(),
                        "Workflow decision accepted"
                    );
                    DecisionResult::accepted(&decision, accepted.status)
                }
                Err(failure) => failure.into_result(&decision),
            }
        }
        .instrument(span)
        .await
    }

    /// Run both phases; the first failure short-circuits.
    async fn relay(
        &self,
        decision: &ValidatedDecision,
    ) -> Result<SubmissionAccepted, RelayFailure> {
        let destination = self
            .resolver
            .resolve(&self.settings.destination)
            .map_err(|e| {
                tracing::error!(
                    destination = %self.settings.destination,
                    error = %e,
                    "Destination resolution failed"
                );
                RelayFailure::Token {
                    status: None,
                    reason: e.to_string(),
                }
            })?;

        tracing::debug!(
            destination = %destination.name,
            base_url = %destination.base_url,
            "Destination resolved"
        );

        let token = self.acquire_token(&destination).await?;
        self.submit_decision(&destination, &token, decision).await
    }

    /// Phase one: fetch a fresh anti-forgery token.
    async fn acquire_token(
        &self,
        destination: &Destination,
    ) -> Result<TokenAcquired, RelayFailure> {
        let url = destination.url_for(&self.settings.service_path);

        let mut headers = json_headers();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("Fetch"));

        let response = self
            .dispatch(destination, Method::GET, url.clone(), headers, None)
            .await
            .map_err(|e| {
                tracing::error!(phase = "token", url = %url, error = %e, "Token fetch failed");
                RelayFailure::from(e)
            })?;

        let failure = if !response.is_success() {
            RelayFailure::Token {
                status: Some(response.status),
                reason: format!("HTTP {}", response.status),
            }
        } else if let Some(acquired) = TokenAcquired::from_headers(&response.headers) {
            tracing::debug!(
                has_cookies = acquired.cookies.is_some(),
                "CSRF token acquired"
            );
            return Ok(acquired);
        } else {
            RelayFailure::Token {
                status: Some(response.status),
                reason: "No CSRF token received from server".to_string(),
            }
        };

        if let RelayFailure::Token { status, reason } = &failure {
            tracing::error!(
                phase = "token",
                url = %url,
                status = ?status,
                reason = %reason,
                "Token fetch rejected"
            );
        }
        Err(failure)
    }

    /// Phase two: post the decision with the acquired token.
    async fn submit_decision(
        &self,
        destination: &Destination,
        token: &TokenAcquired,
        decision: &ValidatedDecision,
    ) -> Result<SubmissionAccepted, RelayFailure> {
        let service_url = destination.url_for(&self.settings.service_path);
        let url = decision_url(&service_url, decision);

        let mut headers = json_headers();
        headers.insert(
            CSRF_HEADER,
            HeaderValue::from_str(&token.token).map_err(|e| RelayFailure::Token {
                status: None,
                reason: format!("Unusable CSRF token: {}", e),
            })?,
        );
        if let Some(cookies) = &token.cookies {
            if let Ok(value) = HeaderValue::from_str(cookies) {
                headers.insert(COOKIE, value);
            }
        }

        let response = self
            .dispatch(
                destination,
                Method::POST,
                url.clone(),
                headers,
                Some(serde_json::json!({})),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    phase = "decision",
                    url = %url,
                    error = %e,
                    "Decision submission failed"
                );
                RelayFailure::from(e)
            })?;

        if !response.is_success() {
            tracing::error!(
                phase = "decision",
                url = %url,
                status = response.status,
                body = %response.body,
                "Decision rejected by remote system"
            );
            return Err(RelayFailure::Submission {
                status: response.status,
                details: response_details(&response.body),
            });
        }

        if !response.body.trim().is_empty() {
            tracing::debug!(body = %response.body, "Decision response data");
        }

        Ok(SubmissionAccepted {
            status: response.status,
        })
    }

    /// Send one request, bounded by the configured timeout regardless of
    /// what the transport enforces itself.
    async fn dispatch(
        &self,
        destination: &Destination,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<serde_json::Value>,
    ) -> Result<OutboundResponse, TransportError> {
        let timeout = self.settings.timeout;
        let request = OutboundRequest {
            method,
            url,
            headers,
            body,
            auth: destination.auth.clone(),
            timeout,
        };

        tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Check presence and the decision code.
///
/// Empty strings count as missing. On success the comments are defaulted
/// per decision code.
pub fn validate(request: &DecisionRequest) -> Result<ValidatedDecision, DecisionResult> {
    let instance_id = present(&request.instance_id);
    let decision = present(&request.decision);

    let (instance_id, decision) = match (instance_id, decision) {
        (Some(instance_id), Some(decision)) => (instance_id, decision),
        (instance_id, decision) => {
            let mut missing = Vec::new();
            if instance_id.is_none() {
                missing.push("instanceId");
            }
            if decision.is_none() {
                missing.push("decision");
            }
            tracing::warn!(missing = ?missing, "Missing required parameters");

            return Err(DecisionResult::failed(
                instance_id,
                decision,
                ErrorCode::MissingParameters,
                format!("Missing required parameters: {}", missing.join(", ")),
            ));
        }
    };

    let code = decision.parse::<DecisionCode>().map_err(|_| {
        tracing::warn!(decision = %decision, "Invalid decision parameter");
        DecisionResult::failed(
            Some(instance_id),
            Some(decision),
            ErrorCode::InvalidDecision,
            "Invalid decision parameter. Must be 0001 (Approve) or 0002 (Reject)",
        )
    })?;

    let comments = present(&request.comments)
        .unwrap_or(code.default_comment())
        .to_string();

    Ok(ValidatedDecision {
        instance_id: instance_id.to_string(),
        decision: code,
        comments,
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
