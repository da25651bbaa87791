//! Configuration for the Kubernetes-backed reader
//!
//! Built programmatically - no config files needed.
//!
//! # Example
//!
//! ```
//! use suite_fetcher::config::FetcherConfig;
//!
//! let config = FetcherConfig::new()
//!     .kubeconfig("/etc/kubernetes/ci.kubeconfig")
//!     .context("ci-cluster");
//! ```

use crate::types::DefinitionResource;

/// Errors from building a reader out of configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid resource coordinates: {0}")]
    InvalidResource(String),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("Failed to create Kubernetes client: {0}")]
    Client(String),
}

/// Where and how to read `TestDefinition` resources
#[derive(Debug, Clone, Default)]
pub struct FetcherConfig {
    /// Kubeconfig path, `None` to infer (in-cluster or `$KUBECONFIG`)
    pub kubeconfig: Option<String>,

    /// Kubectl context, `None` for the current context
    pub context: Option<String>,

    /// Custom resource holding test definitions
    pub resource: DefinitionResource,
}

impl FetcherConfig {
    /// Create config that infers the cluster connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Set kubeconfig path
    #[must_use]
    pub fn kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Set kubectl context
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Read definitions from a different custom resource
    #[must_use]
    pub fn resource(mut self, resource: DefinitionResource) -> Self {
        self.resource = resource;
        self
    }

    /// Check the resource coordinates are complete
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidResource` if version, plural or kind is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resource = &self.resource;
        for (field, value) in [
            ("version", &resource.version),
            ("plural", &resource.plural),
            ("kind", &resource.kind),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidResource(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::new();

        assert!(config.kubeconfig.is_none());
        assert!(config.context.is_none());
        assert_eq!(config.resource, DefinitionResource::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = FetcherConfig::new()
            .kubeconfig("/etc/kubernetes/ci.kubeconfig")
            .context("ci-context")
            .resource(DefinitionResource::new("example.com", "v1", "checks", "Check"));

        assert_eq!(config.kubeconfig, Some("/etc/kubernetes/ci.kubeconfig".to_string()));
        assert_eq!(config.context, Some("ci-context".to_string()));
        assert_eq!(config.resource.group, "example.com");
    }

    #[test]
    fn test_validate_rejects_missing_plural() {
        let config =
            FetcherConfig::new().resource(DefinitionResource::new("example.com", "v1", "", "Check"));

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid resource coordinates: plural must not be empty"
        );
    }
}
