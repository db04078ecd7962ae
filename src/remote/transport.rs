//! Outbound HTTP transport.
//!
//! The relay talks to the remote system only through [`HttpTransport`], so
//! tests can swap the network for a scripted fake. Non-2xx responses are
//! returned as responses; only failures to obtain a response are errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use thiserror::Error;

use crate::remote::AuthProvider;

/// A single outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
    pub auth: AuthProvider,
    pub timeout: Duration,
}

/// Response as observed on the wire, whatever the status.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl OutboundResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Request failed: {message}")]
    Request {
        /// Status reported alongside the failure, if any.
        status: Option<u16>,
        message: String,
    },
}

impl TransportError {
    pub fn request(message: impl Into<String>) -> Self {
        TransportError::Request {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

/// Production transport over a pooled `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(format!("workflow-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let timeout = request.timeout;

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(timeout);

        builder = match &request.auth {
            AuthProvider::None => builder,
            AuthProvider::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            AuthProvider::Bearer { token } => builder.bearer_auth(token),
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;

        Ok(OutboundResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_reqwest_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() && is_connection_refused(err) {
        TransportError::ConnectionRefused(err.to_string())
    } else {
        TransportError::Request {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Walk the source chain looking for an `ECONNREFUSED` io error.
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(method: Method, url: String, auth: AuthProvider) -> OutboundRequest {
        OutboundRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            auth,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_returns_non_success_status_as_response() {
        let app = Router::new().route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such service") }),
        );
        let base = spawn_server(app).await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(Method::GET, format!("{}/missing", base), AuthProvider::None))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert_eq!(response.body, "no such service");
    }

    #[tokio::test]
    async fn test_applies_basic_auth_and_json_body() {
        let app = Router::new().route(
            "/echo",
            post(|headers: AxumHeaders, body: String| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!("{}|{}", auth, body)
            }),
        );
        let base = spawn_server(app).await;

        let transport = ReqwestTransport::new().unwrap();
        let mut outbound = request(
            Method::POST,
            format!("{}/echo", base),
            AuthProvider::Basic {
                username: "relay".to_string(),
                password: "secret".to_string(),
            },
        );
        outbound.body = Some(serde_json::json!({}));

        let response = transport.send(outbound).await.unwrap();
        assert_eq!(response.status, 200);
        // base64("relay:secret")
        assert_eq!(response.body, "Basic cmVsYXk6c2VjcmV0|{}");
    }

    #[tokio::test]
    async fn test_times_out_slow_server() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late"
            }),
        );
        let base = spawn_server(app).await;

        let transport = ReqwestTransport::new().unwrap();
        let mut outbound = request(Method::GET, format!("{}/slow", base), AuthProvider::None);
        outbound.timeout = Duration::from_millis(100);

        let err = transport.send(outbound).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .send(request(Method::GET, format!("http://{}/", addr), AuthProvider::None))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::ConnectionRefused(_)), "{:?}", err);
    }
}
