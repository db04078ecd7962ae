//! Workflow Relay
//!
//! Forwards approve/reject decisions for workflow tasks to a remote
//! task-processing service and serves the static approval UI.

use std::sync::Arc;

use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod error;
mod logging;
mod relay;
mod remote;
mod services;

use crate::api::build_router;
use crate::config::Config;
use crate::error::RelayResult;
use crate::relay::{DecisionRelay, RelaySettings};
use crate::remote::{ConfigDestinationResolver, ReqwestTransport};
use crate::services::ServiceRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The decision relay.
    pub relay: Arc<DecisionRelay>,
    /// Optional collaborators registered at startup.
    pub services: ServiceRegistry,
}

impl AppState {
    /// Wire the relay and its collaborators from configuration.
    fn from_config(config: &Config) -> RelayResult<Self> {
        let resolver = ConfigDestinationResolver::new(config.destinations.clone());
        let transport = ReqwestTransport::new()?;

        let relay = DecisionRelay::new(
            Arc::new(resolver),
            Arc::new(transport),
            RelaySettings::from(&config.relay),
        );

        Ok(Self {
            relay: Arc::new(relay),
            services: ServiceRegistry::from_config(&config.services, &config.relay.action_prefix),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    // This is optional and won't fail if .env doesn't exist
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    // Load configuration (logging settings come from it)
    let config = Config::load().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Initialize logging
    logging::init(&config.logging);

    tracing::info!("Starting Workflow Relay v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        environment = %config.server.environment,
        destination = %config.relay.destination,
        timeout_secs = config.relay.timeout_secs,
        "Configuration loaded"
    );

    if config.destination(&config.relay.destination).is_none() {
        tracing::warn!(
            destination = %config.relay.destination,
            "Destination is not configured - every decision will fail until it is"
        );
    }

    let state = AppState::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize relay");
        anyhow::anyhow!("Initialization error: {}", e)
    })?;
    let services = state.services.clone();

    // Build router
    let app = build_router(
        state,
        &config.relay.action_prefix,
        &config.static_files,
        config.server.environment,
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!(
        "Decision action available at http://{}{}/processWorkflowDecision",
        addr,
        config.relay.action_prefix
    );
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    services.log_availability();

    axum::serve(listener, app).await?;

    Ok(())
}
