//! Resolution of suite selectors into test definitions
//!
//! A suite selects definitions by explicit name references, by label
//! expressions, or both. Results are returned in a stable order:
//!
//! 1. definitions referenced by name, in reference order
//! 2. definitions matched by label expressions, in listing order, expression
//!    by expression
//!
//! Each definition appears once, at its first position. Identity is the uid,
//! or namespace and name for objects that carry no uid.
//! A suite without any selector selects every definition in the cluster.
//!
//! References and expressions are resolved one at a time and the first
//! failure ends the call; no partial result is returned.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::reader::DefinitionReader;
use crate::selector::LabelSelector;
use crate::types::{ClusterTestSuite, TestDefReference, TestDefinition, TestsSelector};

/// Finds the test definitions selected by a suite
pub struct DefinitionFetcher<R> {
    reader: R,
}

impl<R: DefinitionReader> DefinitionFetcher<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Resolve the selectors of `suite`
    ///
    /// # Errors
    ///
    /// Returns the first `FetchError` hit while resolving. Use
    /// [`FetchError::human_readable`] for the message shown to users.
    pub async fn find_matching(
        &self,
        suite: &ClusterTestSuite,
    ) -> Result<Vec<TestDefinition>, FetchError> {
        let result = self.find_for_selector(&suite.spec.selectors).await;

        match &result {
            Ok(definitions) => info!(
                suite = %suite.name(),
                count = definitions.len(),
                "Resolved test definitions"
            ),
            Err(err) => warn!(
                suite = %suite.name(),
                kind = ?err.kind(),
                attribution = %err.attribution(),
                error = %err,
                "Failed to resolve test definitions"
            ),
        }

        result
    }

    /// Resolve a selector outside of a suite
    ///
    /// # Errors
    ///
    /// Returns the first `FetchError` hit while resolving.
    pub async fn find_for_selector(
        &self,
        selector: &TestsSelector,
    ) -> Result<Vec<TestDefinition>, FetchError> {
        if selector.is_empty() {
            debug!("No selectors specified, selecting all test definitions");
            let all = self
                .reader
                .list(None)
                .await
                .map_err(|source| FetchError::All { source })?;
            return Ok(unique(all));
        }

        let by_names = self.find_by_names(&selector.match_names).await?;
        let by_labels = self
            .find_by_label_expressions(&selector.match_label_expressions)
            .await?;

        Ok(unique(by_names.into_iter().chain(by_labels)))
    }

    /// Fetch each referenced definition, in reference order
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Reference` for the first reference that cannot be
    /// fetched. It is classified `NotFound` when the definition does not exist.
    pub async fn find_by_names(
        &self,
        references: &[TestDefReference],
    ) -> Result<Vec<TestDefinition>, FetchError> {
        let mut definitions = Vec::with_capacity(references.len());

        for reference in references {
            debug!(
                name = %reference.name,
                namespace = %reference.namespace,
                "Fetching test definition by name"
            );

            let definition = self
                .reader
                .get(&reference.namespace, &reference.name)
                .await
                .map_err(|source| FetchError::Reference {
                    reference: reference.clone(),
                    source,
                })?;
            definitions.push(definition);
        }

        Ok(definitions)
    }

    /// List the definitions matching any of the label expressions
    ///
    /// All expressions are parsed before the first listing call.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidExpression` for the first malformed
    /// expression, or `FetchError::Expression` for the first failed listing.
    pub async fn find_by_label_expressions(
        &self,
        expressions: &[String],
    ) -> Result<Vec<TestDefinition>, FetchError> {
        let selectors = expressions
            .iter()
            .map(|expression| {
                LabelSelector::parse(expression).map_err(|source| {
                    FetchError::InvalidExpression {
                        expression: expression.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut definitions = Vec::new();
        let mut seen = HashSet::new();

        for (expression, selector) in expressions.iter().zip(&selectors) {
            debug!(expression = %expression, "Listing test definitions by label expression");

            let matched = self
                .reader
                .list(Some(selector))
                .await
                .map_err(|source| FetchError::Expression {
                    expression: expression.clone(),
                    source,
                })?;

            for definition in matched {
                if seen.insert(definition.identity()) {
                    definitions.push(definition);
                }
            }
        }

        Ok(definitions)
    }
}

/// Drop every definition whose identity already appeared, keeping first occurrences
fn unique(definitions: impl IntoIterator<Item = TestDefinition>) -> Vec<TestDefinition> {
    let mut seen = HashSet::new();
    definitions
        .into_iter()
        .filter(|definition| seen.insert(definition.identity()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::reader::{MemoryReader, ReadError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn def(name: &str, uid: &str) -> TestDefinition {
        TestDefinition::new(name, "ns").with_uid(uid)
    }

    /// Fails every call with a store fault and counts the calls
    #[derive(Default)]
    struct FailingReader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DefinitionReader for FailingReader {
        async fn get(&self, _namespace: &str, _name: &str) -> Result<TestDefinition, ReadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ReadError::Store("some error".to_string()))
        }

        async fn list(
            &self,
            _selector: Option<&LabelSelector>,
        ) -> Result<Vec<TestDefinition>, ReadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ReadError::Store("some error".to_string()))
        }
    }

    #[test]
    fn test_unique_keeps_first_occurrence() {
        let out = unique(vec![
            def("b", "uid-b"),
            def("a", "uid-a"),
            def("b-again", "uid-b"),
            def("c", "uid-c"),
        ]);

        let names: Vec<&str> = out.iter().map(TestDefinition::name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unique_without_uid_falls_back_to_namespace_and_name() {
        let out = unique(vec![
            TestDefinition::new("test-a", "ns"),
            TestDefinition::new("test-b", "ns"),
            TestDefinition::new("test-a", "other-ns"),
            TestDefinition::new("test-a", "ns"),
        ]);

        let refs: Vec<String> = out.iter().map(|d| d.reference().to_string()).collect();
        assert_eq!(
            refs,
            vec![
                "[name: test-a, namespace: ns]",
                "[name: test-b, namespace: ns]",
                "[name: test-a, namespace: other-ns]",
            ]
        );
    }

    #[tokio::test]
    async fn test_find_by_names_keeps_reference_order() {
        let fetcher = DefinitionFetcher::new(MemoryReader::from_iter([
            def("test-a", "uid-a"),
            def("test-b", "uid-b"),
            def("test-c", "uid-c"),
        ]));

        let out = fetcher
            .find_by_names(&[
                TestDefReference::new("test-c", "ns"),
                TestDefReference::new("test-a", "ns"),
            ])
            .await
            .unwrap();

        let names: Vec<&str> = out.iter().map(TestDefinition::name).collect();
        assert_eq!(names, vec!["test-c", "test-a"]);
    }

    #[tokio::test]
    async fn test_find_by_names_stops_at_first_failure() {
        let reader = FailingReader::default();
        let fetcher = DefinitionFetcher::new(reader);

        let err = fetcher
            .find_by_names(&[
                TestDefReference::new("first", "ns"),
                TestDefReference::new("second", "ns"),
            ])
            .await
            .unwrap_err();

        assert_eq!(fetcher.reader().calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("[name: first, namespace: ns]"));
    }

    #[tokio::test]
    async fn test_find_by_label_expressions_first_seen_order() {
        let fetcher = DefinitionFetcher::new(MemoryReader::from_iter([
            def("test-a", "uid-a").with_label("test", "true"),
            def("test-b", "uid-b").with_label("other", "1"),
            def("test-c", "uid-c")
                .with_label("test", "true")
                .with_label("other", "2"),
        ]));

        let out = fetcher
            .find_by_label_expressions(&["other".to_string(), "test=true".to_string()])
            .await
            .unwrap();

        let names: Vec<&str> = out.iter().map(TestDefinition::name).collect();
        assert_eq!(names, vec!["test-b", "test-c", "test-a"]);
    }

    #[tokio::test]
    async fn test_invalid_expression_fails_before_listing() {
        let fetcher = DefinitionFetcher::new(FailingReader::default());

        let err = fetcher
            .find_by_label_expressions(&["test=true".to_string(), "test!=true".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::InvalidExpression { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(fetcher.reader().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_attributed_to_expression() {
        let fetcher = DefinitionFetcher::new(FailingReader::default());

        let err = fetcher
            .find_by_label_expressions(&["test=true".to_string(), "other".to_string()])
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "while fetching test definitions with label expression [test=true]: some error"
        );
        assert_eq!(fetcher.reader().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_select_all_failure() {
        let fetcher = DefinitionFetcher::new(FailingReader::default());

        let err = fetcher
            .find_for_selector(&TestsSelector::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::All { .. }));
        assert_eq!(err.human_readable().message, "Internal error");
    }

    #[tokio::test]
    async fn test_empty_store_with_expressions_is_ok() {
        let fetcher = DefinitionFetcher::new(MemoryReader::new());

        let out = fetcher
            .find_for_selector(&TestsSelector::new().label_expression("test"))
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
