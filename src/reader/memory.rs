//! In-memory definition store
//!
//! Behaves like an API server backed by etcd: objects are keyed by namespace
//! and name, listings come back in key order, label filtering happens on the
//! store side, and objects stored without a uid get one assigned.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{DefinitionReader, ReadError};
use crate::selector::LabelSelector;
use crate::types::{DefinitionResource, TestDefinition};

type Key = (String, String);

/// In-memory `TestDefinition` store
#[derive(Debug, Default)]
pub struct MemoryReader {
    resource: DefinitionResource,
    objects: RwLock<BTreeMap<Key, TestDefinition>>,
    next_uid: AtomicU64,
}

impl MemoryReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom resource name in not-found errors
    #[must_use]
    pub fn with_resource(mut self, resource: DefinitionResource) -> Self {
        self.resource = resource;
        self
    }

    /// Store a definition, replacing any with the same namespace and name
    ///
    /// A definition without a uid keeps the uid of the object it replaces, or
    /// gets a fresh one.
    pub async fn insert(&self, mut definition: TestDefinition) -> Option<TestDefinition> {
        let mut objects = self.objects.write().await;
        let key = key_of(&definition);

        if definition.uid().is_empty() {
            let uid = match objects.get(&key) {
                Some(existing) if !existing.uid().is_empty() => existing.uid().to_string(),
                _ => self.assign_uid(),
            };
            definition.metadata.uid = Some(uid);
        }

        objects.insert(key, definition)
    }

    pub async fn remove(&self, namespace: &str, name: &str) -> Option<TestDefinition> {
        self.objects
            .write()
            .await
            .remove(&(namespace.to_string(), name.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn assign_uid(&self) -> String {
        let n = self.next_uid.fetch_add(1, Ordering::Relaxed);
        format!("memory-{n:08}")
    }
}

impl FromIterator<TestDefinition> for MemoryReader {
    fn from_iter<I: IntoIterator<Item = TestDefinition>>(iter: I) -> Self {
        let reader = Self::default();
        let mut objects = BTreeMap::new();

        for mut def in iter {
            if def.uid().is_empty() {
                def.metadata.uid = Some(reader.assign_uid());
            }
            objects.insert(key_of(&def), def);
        }

        Self {
            objects: RwLock::new(objects),
            ..reader
        }
    }
}

fn key_of(definition: &TestDefinition) -> Key {
    (
        definition.namespace().to_string(),
        definition.name().to_string(),
    )
}

#[async_trait]
impl DefinitionReader for MemoryReader {
    #[instrument(skip(self), fields(reader = "memory"))]
    async fn get(&self, namespace: &str, name: &str) -> Result<TestDefinition, ReadError> {
        self.objects
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ReadError::NotFound {
                resource: self.resource.qualified_name(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
    }

    #[instrument(skip(self, selector), fields(reader = "memory", selector = ?selector.map(ToString::to_string)))]
    async fn list(
        &self,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<TestDefinition>, ReadError> {
        let items: Vec<TestDefinition> = self
            .objects
            .read()
            .await
            .values()
            .filter(|def| selector.map_or(true, |s| s.matches(def.labels())))
            .cloned()
            .collect();

        debug!(count = items.len(), "Listed definitions");
        Ok(items)
    }
}
