//! Suite Fetcher - test suite selector resolution
//!
//! Resolves the selectors of a `ClusterTestSuite` into the concrete, ordered and
//! deduplicated list of `TestDefinition` resources a test run should execute.
//! Definitions are read through the [`DefinitionReader`] trait, backed either by
//! a live Kubernetes API ([`KubeReader`]) or an in-memory store ([`MemoryReader`]).
//!
//! # Example
//!
//! ```no_run
//! use suite_fetcher::{ClusterTestSuite, DefinitionFetcher, FetcherConfig, KubeReader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = KubeReader::from_config(&FetcherConfig::new()).await?;
//!     let fetcher = DefinitionFetcher::new(reader);
//!
//!     let suite = ClusterTestSuite::default();
//!     match fetcher.find_matching(&suite).await {
//!         Ok(definitions) => println!("{} tests selected", definitions.len()),
//!         Err(err) => eprintln!("{}", err.human_readable()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod reader;
pub mod selector;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, FetcherConfig};
pub use error::{Attribution, ErrorKind, FetchError, HumanError};
pub use fetcher::DefinitionFetcher;
pub use reader::{DefinitionReader, KubeReader, MemoryReader, ReadError};
pub use selector::{LabelSelector, Requirement, SelectorError};
pub use types::{
    ClusterTestSuite, DefinitionResource, Identity, TestDefReference, TestDefinition,
    TestDefinitionSpec, TestSuiteSpec, TestsSelector,
};
