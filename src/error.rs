//! Classified errors returned by the fetcher
//!
//! Every `FetchError` names the selector element that caused it and keeps the
//! underlying cause, so the full `Display` output is suitable for logs. Callers
//! that report to users should use [`FetchError::human_readable`] instead,
//! which only distinguishes a missing test definition from everything else.

use crate::reader::ReadError;
use crate::selector::SelectorError;
use crate::types::TestDefReference;
use std::fmt;

/// Message shown to users for every fault that is not a missing definition
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// Who a fault should be reported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A definition referenced by name does not exist
    NotFound,
    /// Anything else: store unreachable, permission denied, bad expression...
    Internal,
}

/// User-facing summary of a `FetchError`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HumanError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Errors from resolving a suite's selectors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("while fetching test definition from selector {reference}: {source}")]
    Reference {
        reference: TestDefReference,
        source: ReadError,
    },

    #[error("while fetching test definitions with label expression [{expression}]: {source}")]
    Expression { expression: String, source: ReadError },

    #[error("while parsing label expression [{expression}]: {source}")]
    InvalidExpression {
        expression: String,
        source: SelectorError,
    },

    #[error("while fetching all test definitions: {source}")]
    All { source: ReadError },
}

impl FetchError {
    /// Only a single-object fetch that found nothing is user-facing
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Reference { source, .. } if source.is_not_found() => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Selector element the error is attributed to
    pub fn attribution(&self) -> Attribution<'_> {
        match self {
            Self::Reference { reference, .. } => Attribution::Reference(reference),
            Self::Expression { expression, .. } | Self::InvalidExpression { expression, .. } => {
                Attribution::Expression(expression)
            }
            Self::All { .. } => Attribution::AllDefinitions,
        }
    }

    pub fn human_readable(&self) -> HumanError {
        let kind = self.kind();
        let message = match (kind, self) {
            (ErrorKind::NotFound, Self::Reference { reference, .. }) => {
                format!("Test Definition {reference} does not exist")
            }
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        };
        HumanError { kind, message }
    }
}

/// The part of a selector a `FetchError` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution<'a> {
    Reference(&'a TestDefReference),
    Expression(&'a str),
    /// Select-all listing for an empty selector
    AllDefinitions,
}

impl fmt::Display for Attribution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(reference) => write!(f, "reference {reference}"),
            Self::Expression(expression) => write!(f, "label expression [{expression}]"),
            Self::AllDefinitions => f.write_str("all test definitions"),
        }
    }
}
