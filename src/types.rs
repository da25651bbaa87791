//! Resource types read and produced by the fetcher
//!
//! `TestDefinition` and `ClusterTestSuite` mirror the `testing.kyma-project.io`
//! custom resources. Only the fields the selection logic and its callers need
//! are typed; unknown fields are ignored on decode.

use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single executable test, owned by the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: TestDefinitionSpec,
}

impl TestDefinition {
    /// Create a definition with the given name and namespace
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            spec: TestDefinitionSpec::default(),
        }
    }

    /// Set the identity token
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.metadata.uid = Some(uid.into());
        self
    }

    /// Add a label
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Store-assigned identity token, empty if the object was never persisted
    pub fn uid(&self) -> &str {
        self.metadata.uid.as_deref().unwrap_or_default()
    }

    /// Labels of the definition (empty map when none are set)
    pub fn labels(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.metadata.labels.as_ref().unwrap_or(&EMPTY)
    }

    /// Reference that selects exactly this definition
    pub fn reference(&self) -> TestDefReference {
        TestDefReference::new(self.name(), self.namespace())
    }

    /// Key two definitions are considered the same object by
    ///
    /// The uid when set, otherwise namespace and name.
    pub fn identity(&self) -> Identity {
        match self.metadata.uid.as_deref() {
            Some(uid) if !uid.is_empty() => Identity::Uid(uid.to_string()),
            _ => Identity::Key(self.reference()),
        }
    }
}

/// Identity of a stored `TestDefinition`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Uid(String),
    /// Object without a store-assigned uid
    Key(TestDefReference),
}

/// Spec of a `TestDefinition`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinitionSpec {
    /// Pod template the test runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    /// Skip the test when the suite runs
    #[serde(default)]
    pub skip: bool,

    /// Never run this test in parallel with others
    #[serde(default)]
    pub disable_concurrency: bool,

    /// Test timeout in Go duration format (e.g. "5m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reference to exactly one `TestDefinition` by name and namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestDefReference {
    pub name: String,
    pub namespace: String,
}

impl TestDefReference {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for TestDefReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[name: {}, namespace: {}]", self.name, self.namespace)
    }
}

/// Which tests a suite should run
///
/// Definitions selected by `match_names` and by `match_label_expressions` are
/// combined. A selector with both lists empty selects every definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestsSelector {
    #[serde(default)]
    pub match_names: Vec<TestDefReference>,

    #[serde(default)]
    pub match_label_expressions: Vec<String>,
}

impl TestsSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a definition by name and namespace
    #[must_use]
    pub fn name(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.match_names.push(TestDefReference::new(name, namespace));
        self
    }

    /// Select definitions by label expression
    #[must_use]
    pub fn label_expression(mut self, expression: impl Into<String>) -> Self {
        self.match_label_expressions.push(expression.into());
        self
    }

    /// True when the selector selects every definition
    pub fn is_empty(&self) -> bool {
        self.match_names.is_empty() && self.match_label_expressions.is_empty()
    }
}

/// Cluster-scoped test suite
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterTestSuite {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: TestSuiteSpec,
}

impl ClusterTestSuite {
    pub fn new(name: impl Into<String>, selectors: TestsSelector) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            spec: TestSuiteSpec {
                selectors,
                ..Default::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

/// Spec of a `ClusterTestSuite`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteSpec {
    #[serde(default)]
    pub selectors: TestsSelector,

    /// Maximum number of tests running at the same time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i64>,

    /// Timeout for the whole suite in Go duration format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_timeout: Option<String>,

    /// How many times every test is executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,
}

/// Coordinates of the `TestDefinition` custom resource
///
/// Used by the Kubernetes reader to build dynamic API handles without a
/// compiled-in resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionResource {
    /// API group (e.g., "testing.kyma-project.io")
    pub group: String,
    /// API version (e.g., "v1alpha1")
    pub version: String,
    /// Plural resource name (e.g., "testdefinitions")
    pub plural: String,
    /// Kind name (e.g., "TestDefinition")
    pub kind: String,
}

impl DefinitionResource {
    #[must_use]
    pub fn new(group: &str, version: &str, plural: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            plural: plural.to_string(),
            kind: kind.to_string(),
        }
    }

    /// `plural.group`, the name the API server uses in error messages
    pub fn qualified_name(&self) -> String {
        if self.group.is_empty() {
            self.plural.clone()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }

    /// Convert to kube `ApiResource`
    pub(crate) fn to_api_resource(&self) -> kube::core::ApiResource {
        kube::core::ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: if self.group.is_empty() {
                self.version.clone()
            } else {
                format!("{}/{}", self.group, self.version)
            },
            kind: self.kind.clone(),
            plural: self.plural.clone(),
        }
    }
}

impl Default for DefinitionResource {
    fn default() -> Self {
        Self::new(
            "testing.kyma-project.io",
            "v1alpha1",
            "testdefinitions",
            "TestDefinition",
        )
    }
}
