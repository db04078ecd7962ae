//! Scripted transport and resolver for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::remote::{
    AuthProvider, Destination, DestinationResolver, HttpTransport, OutboundRequest,
    OutboundResponse, ResolveError, TransportError,
};

/// What the fake returns for the next call.
pub enum FakeReply {
    Respond(OutboundResponse),
    Fail(TransportError),
    /// Never answers within any reasonable timeout.
    Stall,
}

impl FakeReply {
    /// Token-fetch answer carrying a CSRF token and session cookies.
    pub fn token(token: &str, cookies: &[&str]) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("x-csrf-token", HeaderValue::from_str(token).unwrap());
        for cookie in cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        FakeReply::Respond(OutboundResponse {
            status: 200,
            headers,
            body: String::new(),
        })
    }

    pub fn status(status: u16, body: &str) -> Self {
        FakeReply::Respond(OutboundResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
        })
    }
}

/// Replays scripted replies in order and records every request it sees.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<FakeReply>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl FakeTransport {
    pub fn new(replies: Vec<FakeReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(FakeReply::Respond(response)) => Ok(response),
            Some(FakeReply::Fail(err)) => Err(err),
            Some(FakeReply::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::request("stalled"))
            }
            None => panic!("FakeTransport ran out of scripted replies"),
        }
    }
}

/// Resolves every name to a fixed test destination.
pub struct StaticResolver {
    pub base_url: String,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self {
            base_url: "https://s4.test".to_string(),
        }
    }
}

impl DestinationResolver for StaticResolver {
    fn resolve(&self, name: &str) -> Result<Destination, ResolveError> {
        Ok(Destination {
            name: name.to_string(),
            base_url: self.base_url.clone(),
            auth: AuthProvider::Basic {
                username: "relay".to_string(),
                password: "secret".to_string(),
            },
        })
    }
}

/// Knows no destinations at all.
pub struct EmptyResolver;

impl DestinationResolver for EmptyResolver {
    fn resolve(&self, name: &str) -> Result<Destination, ResolveError> {
        Err(ResolveError::NotFound(name.to_string()))
    }
}
