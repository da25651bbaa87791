//! Kubernetes API reader
//!
//! Reads `TestDefinition` custom resources through the dynamic client, so the
//! resource coordinates can be configured at runtime.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{debug, instrument};

use super::{DefinitionReader, ReadError};
use crate::config::{ConfigError, FetcherConfig};
use crate::selector::LabelSelector;
use crate::types::{DefinitionResource, TestDefinition};

/// Reader backed by a Kubernetes API server
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
    resource: DefinitionResource,
}

impl KubeReader {
    #[must_use]
    pub fn new(client: Client, resource: DefinitionResource) -> Self {
        Self { client, resource }
    }

    /// Connect using the given configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid, the kubeconfig
    /// cannot be loaded, or the client cannot be created.
    pub async fn from_config(config: &FetcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };

        let kube_config = match (&config.kubeconfig, &config.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| ConfigError::Kubeconfig(format!("{path}: {e}")))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ConfigError::Kubeconfig(e.to_string()))?
            }
            (None, Some(_)) => kube::Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ConfigError::Kubeconfig(e.to_string()))?,
            (None, None) => kube::Config::infer()
                .await
                .map_err(|e| ConfigError::Kubeconfig(e.to_string()))?,
        };

        let client =
            Client::try_from(kube_config).map_err(|e| ConfigError::Client(e.to_string()))?;

        debug!(resource = %config.resource.qualified_name(), "Created Kubernetes reader");
        Ok(Self::new(client, config.resource.clone()))
    }

    pub fn resource(&self) -> &DefinitionResource {
        &self.resource
    }

    fn decode(&self, object: DynamicObject) -> Result<TestDefinition, ReadError> {
        let value = serde_json::to_value(object).map_err(|e| self.decode_error(&e))?;
        serde_json::from_value(value).map_err(|e| self.decode_error(&e))
    }

    fn decode_error(&self, err: &serde_json::Error) -> ReadError {
        ReadError::Decode {
            resource: self.resource.qualified_name(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl DefinitionReader for KubeReader {
    #[instrument(skip(self), fields(reader = "kube"))]
    async fn get(&self, namespace: &str, name: &str) -> Result<TestDefinition, ReadError> {
        let ar = self.resource.to_api_resource();
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);

        match api.get(name).await {
            Ok(object) => self.decode(object),
            Err(kube::Error::Api(ref ae)) if ae.code == 404 => Err(ReadError::NotFound {
                resource: self.resource.qualified_name(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            Err(e) => Err(ReadError::Kube(e)),
        }
    }

    #[instrument(skip(self, selector), fields(reader = "kube", selector = ?selector.map(ToString::to_string)))]
    async fn list(
        &self,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<TestDefinition>, ReadError> {
        let ar = self.resource.to_api_resource();
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &ar);

        let params = match selector {
            Some(selector) => ListParams::default().labels(&selector.to_string()),
            None => ListParams::default(),
        };

        let list = api.list(&params).await?;
        debug!(count = list.items.len(), "Listed definitions");

        list.items
            .into_iter()
            .map(|object| self.decode(object))
            .collect()
    }
}
