//! Logging configuration
//!
//! Plain tracing-based logging to stderr, filtered by `RUST_LOG`.
//!
//! # Example
//!
//! ```no_run
//! use suite_fetcher::telemetry::init_logging;
//!
//! init_logging();
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging with tracing-subscriber
///
/// Uses RUST_LOG env var for filtering (default: info).
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

/// Initialize logging for tests
///
/// Output goes through the test harness writer so it is only shown for
/// failing tests.
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
