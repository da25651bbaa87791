//! Read access to stored `TestDefinition` resources
//!
//! The fetcher only ever needs two calls from a store: get one definition by
//! namespace and name, and list definitions across all namespaces filtered by
//! a label selector. Two readers are provided:
//! - `KubeReader`: a live Kubernetes API server
//! - `MemoryReader`: an in-memory store with the same semantics

use crate::selector::LabelSelector;
use crate::types::TestDefinition;
use async_trait::async_trait;

mod kube_reader;
mod memory;

pub use kube_reader::KubeReader;
pub use memory::MemoryReader;

/// Error type for reader operations
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Returned by `get` only; an empty listing is not an error
    #[error("{resource} \"{name}\" not found")]
    NotFound {
        resource: String,
        name: String,
        namespace: String,
    },

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },

    #[error("{0}")]
    Store(String),
}

impl ReadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Trait for `TestDefinition` stores
#[async_trait]
pub trait DefinitionReader: Send + Sync {
    /// Get a single definition
    async fn get(&self, namespace: &str, name: &str) -> Result<TestDefinition, ReadError>;

    /// List definitions in all namespaces, optionally filtered by labels
    async fn list(&self, selector: Option<&LabelSelector>)
        -> Result<Vec<TestDefinition>, ReadError>;
}

#[async_trait]
impl<R: DefinitionReader + ?Sized> DefinitionReader for std::sync::Arc<R> {
    async fn get(&self, namespace: &str, name: &str) -> Result<TestDefinition, ReadError> {
        (**self).get(namespace, name).await
    }

    async fn list(
        &self,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<TestDefinition>, ReadError> {
        (**self).list(selector).await
    }
}

#[async_trait]
impl<R: DefinitionReader + ?Sized> DefinitionReader for Box<R> {
    async fn get(&self, namespace: &str, name: &str) -> Result<TestDefinition, ReadError> {
        (**self).get(namespace, name).await
    }

    async fn list(
        &self,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<TestDefinition>, ReadError> {
        (**self).list(selector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ReadError::NotFound {
            resource: "testdefinitions.testing.kyma-project.io".to_string(),
            name: "name".to_string(),
            namespace: "ns".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "testdefinitions.testing.kyma-project.io \"name\" not found"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_error_display() {
        let err = ReadError::Store("some error".to_string());
        assert_eq!(err.to_string(), "some error");
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_boxed_reader_delegates() {
        let reader: Box<dyn DefinitionReader> = Box::new(MemoryReader::from_iter([
            TestDefinition::new("test-a", "ns").with_uid("uid-a"),
        ]));

        let def = reader.get("ns", "test-a").await.unwrap();
        assert_eq!(def.uid(), "uid-a");
        assert_eq!(reader.list(None).await.unwrap().len(), 1);
    }
}
