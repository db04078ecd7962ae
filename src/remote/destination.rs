//! Destination resolution - maps a connection profile name to a base URL
//! and the credentials presented to it.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{DestinationAuthConfig, DestinationConfig};

/// Credentials attached to every outbound call to a destination.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthProvider {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::None => write!(f, "None"),
            AuthProvider::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthProvider::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

impl From<&DestinationAuthConfig> for AuthProvider {
    fn from(config: &DestinationAuthConfig) -> Self {
        match config {
            DestinationAuthConfig::None => AuthProvider::None,
            DestinationAuthConfig::Basic { username, password } => AuthProvider::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            DestinationAuthConfig::Bearer { token } => AuthProvider::Bearer {
                token: token.clone(),
            },
        }
    }
}

/// A resolved connection profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub name: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub auth: AuthProvider,
}

impl Destination {
    /// Join a service path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Destination not found: {0}")]
    NotFound(String),

    #[error("Destination {name} has an invalid URL: {reason}")]
    InvalidUrl { name: String, reason: String },
}

/// Resolves named destinations at call time.
pub trait DestinationResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Destination, ResolveError>;
}

/// Resolver backed by the `destinations` section of the configuration.
///
/// Names are matched case-insensitively.
pub struct ConfigDestinationResolver {
    destinations: HashMap<String, DestinationConfig>,
}

impl ConfigDestinationResolver {
    pub fn new(destinations: HashMap<String, DestinationConfig>) -> Self {
        let destinations = destinations
            .into_iter()
            .map(|(name, config)| (name.to_lowercase(), config))
            .collect();
        Self { destinations }
    }
}

impl DestinationResolver for ConfigDestinationResolver {
    fn resolve(&self, name: &str) -> Result<Destination, ResolveError> {
        let config = self
            .destinations
            .get(&name.to_lowercase())
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

        let url = reqwest::Url::parse(&config.url).map_err(|e| ResolveError::InvalidUrl {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Destination {
            name: name.to_string(),
            base_url: url.as_str().trim_end_matches('/').to_string(),
            auth: AuthProvider::from(&config.auth),
        })
    }
}
