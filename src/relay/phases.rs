//! Typed state between and after the two outbound phases.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, SET_COOKIE};

use crate::domain::{DecisionResult, ValidatedDecision};
use crate::relay::{
    classify_submission_failure, classify_token_failure, classify_transport_failure,
};
use crate::remote::TransportError;

/// Response header carrying the anti-forgery token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Outcome of phase one: a fresh token and the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAcquired {
    pub token: String,
    /// `name=value` pairs joined with `; `, ready for a `Cookie` header.
    pub cookies: Option<String>,
}

impl TokenAcquired {
    /// Extract the token and session cookies from a token-fetch response.
    ///
    /// Returns `None` when the response carries no usable token.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let token = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())?
            .to_string();

        let pairs: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect();

        let cookies = if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        };

        Some(Self { token, cookies })
    }
}

/// Outcome of phase two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAccepted {
    pub status: u16,
}

/// Why an invocation stopped before a decision was accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFailure {
    /// Phase one answered, but not with a token.
    Token {
        status: Option<u16>,
        reason: String,
    },
    /// Phase two answered with a non-success status.
    Submission {
        status: u16,
        details: Option<serde_json::Value>,
    },
    /// No response in either phase.
    Transport(TransportError),
}

impl From<TransportError> for RelayFailure {
    fn from(err: TransportError) -> Self {
        RelayFailure::Transport(err)
    }
}

impl RelayFailure {
    /// Convert into the failure envelope returned to the caller.
    pub fn into_result(self, decision: &ValidatedDecision) -> DecisionResult {
        let instance_id = Some(decision.instance_id.as_str());
        let code = Some(decision.decision.code());

        match self {
            RelayFailure::Token { status, .. } => {
                let classified = classify_token_failure(status);
                DecisionResult::failed(instance_id, code, classified.code, classified.message)
                    .with_http_status(status)
            }
            RelayFailure::Submission { status, details } => {
                let classified = classify_submission_failure(status);
                DecisionResult::failed(instance_id, code, classified.code, classified.message)
                    .with_http_status(Some(status))
                    .with_details(details)
            }
            RelayFailure::Transport(err) => {
                let classified = classify_transport_failure(&err);
                DecisionResult::failed(instance_id, code, classified.code, classified.message)
                    .with_http_status(err.status())
                    .with_details(Some(serde_json::Value::String(err.to_string())))
            }
        }
    }
}

/// Encode like JavaScript's `encodeURIComponent`.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Build the decision function-import URL.
///
/// Instance id and decision key are inserted as supplied; only the
/// comments are encoded.
pub fn decision_url(service_url: &str, decision: &ValidatedDecision) -> String {
    format!(
        "{}/Decision?InstanceID='{}'&DecisionKey='{}'&Comments='{}'",
        service_url,
        decision.instance_id,
        decision.decision.code(),
        encode_uri_component(&decision.comments)
    )
}

/// Upstream error body as JSON when it parses, raw text otherwise.
pub fn response_details(body: &str) -> Option<serde_json::Value> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(trimmed)
            .unwrap_or_else(|_| serde_json::Value::String(trimmed.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DecisionCode, ErrorCode};
    use reqwest::header::HeaderValue;

    fn approve(comments: &str) -> ValidatedDecision {
        ValidatedDecision {
            instance_id: "000001234567".to_string(),
            decision: DecisionCode::Approve,
            comments: comments.to_string(),
        }
    }

    #[test]
    fn test_token_from_headers_with_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("tok123"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("SAP_SESSIONID=abc; path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("sap-usercontext=client=100; path=/"));

        let acquired = TokenAcquired::from_headers(&headers).unwrap();
        assert_eq!(acquired.token, "tok123");
        assert_eq!(
            acquired.cookies.as_deref(),
            Some("SAP_SESSIONID=abc; sap-usercontext=client=100")
        );
    }

    #[test]
    fn test_token_missing_or_blank() {
        assert!(TokenAcquired::from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("  "));
        assert!(TokenAcquired::from_headers(&headers).is_none());
    }

    #[test]
    fn test_token_without_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("tok"));
        let acquired = TokenAcquired::from_headers(&headers).unwrap();
        assert!(acquired.cookies.is_none());
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("Looks good"), "Looks%20good");
        assert_eq!(encode_uri_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
        assert_eq!(encode_uri_component("it's(ok)!*~._-"), "it's(ok)!*~._-");
        assert_eq!(encode_uri_component("größe"), "gr%C3%B6%C3%9Fe");
    }

    #[test]
    fn test_decision_url() {
        let url = decision_url("https://s4.test/svc", &approve("Approved & done"));
        assert_eq!(
            url,
            "https://s4.test/svc/Decision?InstanceID='000001234567'&DecisionKey='0001'&Comments='Approved%20%26%20done'"
        );
    }

    #[test]
    fn test_response_details() {
        assert_eq!(response_details("   "), None);
        assert_eq!(
            response_details(r#"{"error":{"code":"X"}}"#),
            Some(serde_json::json!({"error": {"code": "X"}}))
        );
        assert_eq!(
            response_details("<html>conflict</html>"),
            Some(serde_json::json!("<html>conflict</html>"))
        );
    }

    #[test]
    fn test_token_failure_into_result() {
        let result = RelayFailure::Token {
            status: Some(401),
            reason: "HTTP 401".to_string(),
        }
        .into_result(&approve("x"));

        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorCode::DestinationAuthFailed));
        assert_eq!(result.http_status, Some(401));
        assert!(result.decision_text.is_none());
        assert!(result.details.is_none());
    }

    #[test]
    fn test_transport_failure_into_result_omits_status() {
        let result = RelayFailure::from(TransportError::ConnectionRefused("refused".to_string()))
            .into_result(&approve("x"));

        assert_eq!(result.error, Some(ErrorCode::ConnectionRefused));
        assert!(result.http_status.is_none());
        assert_eq!(
            result.details,
            Some(serde_json::json!("Connection refused: refused"))
        );
    }
}
