//! Configuration module for the workflow relay.
//!
//! Loads configuration from YAML files and environment variables.

use std::collections::HashMap;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    /// Named connection profiles, resolved at call time.
    #[serde(default)]
    pub destinations: HashMap<String, DestinationConfig>,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub environment: DeploymentMode,
}

/// Deployment mode. Only development exposes error details to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Development,
    #[default]
    Production,
}

impl DeploymentMode {
    pub fn exposes_error_details(&self) -> bool {
        matches!(self, DeploymentMode::Development)
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Development => write!(f, "development"),
            DeploymentMode::Production => write!(f, "production"),
        }
    }
}

/// Static asset serving.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// URL prefix the directory is mounted under.
    pub mount_path: String,
    /// Directory on disk.
    pub directory: String,
    /// Target of the `/` redirect.
    pub login_page: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            mount_path: "/app".to_string(),
            directory: "app".to_string(),
            login_page: "/app/login.html".to_string(),
        }
    }
}

/// Prefix the action is served under unless configured otherwise.
pub const DEFAULT_ACTION_PREFIX: &str = "/odata/v4/approval";

/// Decision relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Name of the destination used for both outbound calls.
    pub destination: String,
    /// Task-processing service path appended to the destination URL.
    pub service_path: String,
    /// Inbound prefix the action is served under.
    pub action_prefix: String,
    /// Per-call timeout for the token fetch and the submission.
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            destination: "S4HANA_DEV".to_string(),
            service_path: "/sap/opu/odata/IWPGW/TASKPROCESSING;v=2".to_string(),
            action_prefix: DEFAULT_ACTION_PREFIX.to_string(),
            timeout_secs: 30,
        }
    }
}

/// A named connection profile.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    pub url: String,
    #[serde(default)]
    pub auth: DestinationAuthConfig,
}

/// Credentials presented to a destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DestinationAuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

/// Optional collaborators registered at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesConfig {
    /// Register the service model provider (`$metadata`).
    #[serde(default)]
    pub metadata_provider: bool,
}

/// Log output settings. `RUST_LOG`, when set, overrides `filter`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "workflow_relay=info,tower_http=info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    /// Human-readable single-line output for local runs.
    Text,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (RELAY_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with RELAY_ prefix
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Look up a destination by name, ignoring ASCII case.
    ///
    /// The `config` crate lowercases map keys, so `S4HANA_DEV` is stored as
    /// `s4hana_dev`.
    pub fn destination(&self, name: &str) -> Option<&DestinationConfig> {
        self.destinations
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, destination)| destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_yaml(yaml: &str) -> Config {
        ConfigLoader::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_relay_config() {
        let config = RelayConfig::default();
        assert_eq!(config.destination, "S4HANA_DEV");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.service_path.ends_with("TASKPROCESSING;v=2"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_yaml(
            r#"
server:
  host: 127.0.0.1
  port: 4004
"#,
        );
        assert_eq!(config.server.environment, DeploymentMode::Production);
        assert_eq!(config.static_files.mount_path, "/app");
        assert!(config.destinations.is_empty());
        assert!(!config.services.metadata_provider);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "workflow_relay=info,tower_http=info");
    }

    #[test]
    fn test_logging_config() {
        let config = load_yaml(
            r#"
server:
  host: 127.0.0.1
  port: 4004
logging:
  filter: workflow_relay=debug
  format: text
"#,
        );
        assert_eq!(config.logging.filter, "workflow_relay=debug");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_destination_auth_variants() {
        let config = load_yaml(
            r#"
server:
  host: 127.0.0.1
  port: 4004
  environment: development
destinations:
  S4HANA_DEV:
    url: https://s4.example.com
    auth:
      type: basic
      username: relay
      password: secret
  OTHER:
    url: https://other.example.com
"#,
        );
        assert!(config.server.environment.exposes_error_details());
        assert_eq!(
            config.destination("S4HANA_DEV").unwrap().auth,
            DestinationAuthConfig::Basic {
                username: "relay".to_string(),
                password: "secret".to_string(),
            }
        );
        assert_eq!(
            config.destination("other").unwrap().auth,
            DestinationAuthConfig::None
        );
        assert!(config.destination("MISSING").is_none());
    }
}
