//! Decision codes and inbound decision requests.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Workflow outcome understood by the task-processing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DecisionCode {
    /// `0001`
    #[serde(rename = "0001")]
    Approve,
    /// `0002`
    #[serde(rename = "0002")]
    Reject,
}

impl DecisionCode {
    /// Wire value sent as `DecisionKey`.
    pub fn code(&self) -> &'static str {
        match self {
            DecisionCode::Approve => "0001",
            DecisionCode::Reject => "0002",
        }
    }

    /// Human-readable outcome echoed back as `decisionText`.
    pub fn text(&self) -> &'static str {
        match self {
            DecisionCode::Approve => "Approved",
            DecisionCode::Reject => "Rejected",
        }
    }

    /// Comment submitted when the caller supplied none.
    pub fn default_comment(&self) -> &'static str {
        match self {
            DecisionCode::Approve => "Approved via BTP Workflow System",
            DecisionCode::Reject => "Rejected via BTP Workflow System",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            DecisionCode::Approve => "Workflow task has been approved successfully",
            DecisionCode::Reject => "Workflow task has been rejected successfully",
        }
    }
}

impl std::fmt::Display for DecisionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for DecisionCode {
    type Err = String;

    /// Exact match only: `"1"` or `" 0001"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0001" => Ok(DecisionCode::Approve),
            "0002" => Ok(DecisionCode::Reject),
            _ => Err(format!("Invalid decision code: {}", s)),
        }
    }
}

/// Inbound `processWorkflowDecision` payload.
///
/// Every field is optional on the wire so that absent parameters are
/// reported in the result envelope instead of being rejected by the extractor.
/// Scalars of any JSON type are read as their text, so `"decision": 1`
/// reaches validation as `"1"`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Workflow instance awaiting a decision.
    #[serde(default, deserialize_with = "lenient_text")]
    pub instance_id: Option<String>,
    /// `0001` (approve) or `0002` (reject).
    #[serde(default, deserialize_with = "lenient_text")]
    pub decision: Option<String>,
    /// Free-text comment forwarded to the remote system.
    #[serde(default, deserialize_with = "lenient_text")]
    pub comments: Option<String>,
}

impl DecisionRequest {
    /// Read a request from a raw body, whatever its content type.
    ///
    /// An empty body, or one that is not a JSON object, yields a request
    /// with no parameters so validation reports them as missing.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable decision request body");
                Self::default()
            }
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
impl DecisionRequest {
    pub fn new(
        instance_id: impl Into<String>,
        decision: impl Into<String>,
        comments: Option<&str>,
    ) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            decision: Some(decision.into()),
            comments: comments.map(String::from),
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDecision {
    pub instance_id: String,
    pub decision: DecisionCode,
    /// Comments to submit, already defaulted.
    pub comments: String,
}
