//! Optional collaborators registered at startup.
//!
//! The registry is built once in `main` and passed to the router through
//! [`crate::AppState`]; nothing is looked up from process-wide state.

use std::sync::Arc;

use serde_json::json;

use crate::config::ServicesConfig;

/// Supplies the service model exposed under `$metadata`.
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;
    fn service_model(&self) -> serde_json::Value;
}

/// Describes the approval service and its single action.
pub struct ApprovalServiceModel {
    action_prefix: String,
}

impl ApprovalServiceModel {
    pub fn new(action_prefix: impl Into<String>) -> Self {
        Self {
            action_prefix: action_prefix.into(),
        }
    }
}

impl MetadataProvider for ApprovalServiceModel {
    fn name(&self) -> &str {
        "ModelProviderService"
    }

    fn service_model(&self) -> serde_json::Value {
        json!({
            "service": "ApprovalService",
            "path": self.action_prefix,
            "actions": {
                "processWorkflowDecision": {
                    "kind": "action",
                    "params": {
                        "instanceId": { "type": "String", "required": true },
                        "decision": { "type": "String", "required": true, "enum": ["0001", "0002"] },
                        "comments": { "type": "String", "required": false }
                    },
                    "returns": {
                        "success": "Boolean",
                        "message": "String",
                        "instanceId": "String",
                        "decision": "String",
                        "decisionText": "String",
                        "comments": "String",
                        "timestamp": "String",
                        "error": "String",
                        "httpStatus": "Integer",
                        "details": "Object"
                    }
                }
            }
        })
    }
}

/// Collaborators available to request handlers.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    metadata_provider: Option<Arc<dyn MetadataProvider>>,
}

impl ServiceRegistry {
    pub fn from_config(config: &ServicesConfig, action_prefix: &str) -> Self {
        let registry = Self::default();
        if config.metadata_provider {
            registry.with_metadata_provider(Arc::new(ApprovalServiceModel::new(action_prefix)))
        } else {
            registry
        }
    }

    pub fn with_metadata_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata_provider = Some(provider);
        self
    }

    pub fn metadata_provider(&self) -> Option<&Arc<dyn MetadataProvider>> {
        self.metadata_provider.as_ref()
    }

    /// Log which optional collaborators are available once serving starts.
    pub fn log_availability(&self) {
        match &self.metadata_provider {
            Some(provider) => tracing::info!(
                service = provider.name(),
                "Model provider service is available"
            ),
            None => tracing::debug!("Model provider service not registered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_config() {
        let disabled =
            ServiceRegistry::from_config(&ServicesConfig::default(), "/odata/v4/approval");
        assert!(disabled.metadata_provider().is_none());
        disabled.log_availability();

        let enabled = ServiceRegistry::from_config(
            &ServicesConfig {
                metadata_provider: true,
            },
            "/odata/v4/approval",
        );
        let provider = enabled.metadata_provider().unwrap();
        assert_eq!(provider.name(), "ModelProviderService");
        enabled.log_availability();
    }

    #[test]
    fn test_service_model_describes_action() {
        let model = ApprovalServiceModel::new("/odata/v4/approval").service_model();
        assert_eq!(model["path"], "/odata/v4/approval");
        let params = &model["actions"]["processWorkflowDecision"]["params"];
        assert_eq!(params["decision"]["enum"], json!(["0001", "0002"]));
        assert_eq!(params["comments"]["required"], false);
    }
}
