//! Label expression parsing and matching
//!
//! Label expressions use the equality subset of the Kubernetes label selector
//! syntax. An expression is a comma-separated list of terms that must all hold:
//!
//! - `key` → the label is present with any value
//! - `key=value` or `key==value` → the label has exactly this value
//!
//! Set-based and negated terms (`!=`, `!key`, `in`, `notin`) are rejected.

use std::collections::BTreeMap;
use std::fmt;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// Errors from parsing a label expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("label expression is empty")]
    Empty,

    #[error("empty term in label expression '{0}'")]
    EmptyTerm(String),

    #[error("unsupported operator in term '{0}' (only 'key', 'key=value' and 'key==value' are allowed)")]
    UnsupportedOperator(String),

    #[error("invalid label key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid label value '{value}': {reason}")]
    InvalidValue { value: String, reason: String },
}

/// One term of a label expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Label is present, any value
    HasKey(String),
    /// Label is present with exactly this value
    KeyEquals(String, String),
}

impl Requirement {
    pub fn key(&self) -> &str {
        match self {
            Self::HasKey(key) | Self::KeyEquals(key, _) => key,
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::HasKey(key) => labels.contains_key(key),
            Self::KeyEquals(key, value) => labels.get(key) == Some(value),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HasKey(key) => write!(f, "{key}"),
            Self::KeyEquals(key, value) => write!(f, "{key}={value}"),
        }
    }
}

/// A parsed label expression: all requirements must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Parse a label expression such as `"app=web,tier"`
    ///
    /// # Errors
    ///
    /// Returns `SelectorError` if the expression is empty, contains an empty
    /// term, uses an unsupported operator, or has an invalid key or value.
    pub fn parse(expression: &str) -> Result<Self, SelectorError> {
        if expression.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let requirements = expression
            .split(',')
            .map(|term| parse_term(expression, term))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { requirements })
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// True when every requirement holds for `labels`
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl std::str::FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the canonical form accepted by the API server's `labelSelector` query
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{requirement}")?;
        }
        Ok(())
    }
}

fn parse_term(expression: &str, term: &str) -> Result<Requirement, SelectorError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(SelectorError::EmptyTerm(expression.to_string()));
    }

    if term.starts_with('!') || term.contains("!=") {
        return Err(SelectorError::UnsupportedOperator(term.to_string()));
    }

    let Some((key, value)) = term.split_once('=') else {
        if term.contains(char::is_whitespace) || term.contains('(') {
            return Err(SelectorError::UnsupportedOperator(term.to_string()));
        }
        validate_key(term)?;
        return Ok(Requirement::HasKey(term.to_string()));
    };

    // `key==value` is the same as `key=value`
    let value = value.strip_prefix('=').unwrap_or(value);
    if value.contains('=') {
        return Err(SelectorError::UnsupportedOperator(term.to_string()));
    }

    let (key, value) = (key.trim(), value.trim());
    validate_key(key)?;
    validate_value(value)?;

    Ok(Requirement::KeyEquals(key.to_string(), value.to_string()))
}

/// Qualified name: optional DNS subdomain prefix and `/`, then a name segment
fn validate_key(key: &str) -> Result<(), SelectorError> {
    let invalid = |reason: &str| SelectorError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
                return Err(invalid("prefix must be 1-253 characters"));
            }
            let valid_prefix = prefix.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && !part.starts_with('-')
                    && !part.ends_with('-')
            });
            if !valid_prefix {
                return Err(invalid("prefix must be a DNS subdomain"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() {
        return Err(invalid("name part must not be empty"));
    }
    check_segment(name).map_err(|reason| invalid(&reason))
}

fn validate_value(value: &str) -> Result<(), SelectorError> {
    if value.is_empty() {
        return Ok(());
    }
    check_segment(value).map_err(|reason| SelectorError::InvalidValue {
        value: value.to_string(),
        reason,
    })
}

fn check_segment(segment: &str) -> Result<(), String> {
    if segment.len() > MAX_NAME_LEN {
        return Err(format!("must be at most {MAX_NAME_LEN} characters"));
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("may only contain alphanumerics, '-', '_' and '.'".to_string());
    }
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !alnum(segment.chars().next()) || !alnum(segment.chars().last()) {
        return Err("must start and end with an alphanumeric character".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_bare_key() {
        let selector = LabelSelector::parse("other").unwrap();
        assert_eq!(
            selector.requirements(),
            &[Requirement::HasKey("other".to_string())]
        );
    }

    #[test]
    fn test_parse_equality() {
        let selector = LabelSelector::parse("test=true").unwrap();
        assert_eq!(
            selector.requirements(),
            &[Requirement::KeyEquals("test".to_string(), "true".to_string())]
        );

        let double = LabelSelector::parse("test==true").unwrap();
        assert_eq!(double, selector);
    }

    #[test]
    fn test_parse_multiple_terms_with_whitespace() {
        let selector = LabelSelector::parse(" app = web , tier ").unwrap();
        assert_eq!(
            selector.requirements(),
            &[
                Requirement::KeyEquals("app".to_string(), "web".to_string()),
                Requirement::HasKey("tier".to_string()),
            ]
        );
        assert_eq!(selector.to_string(), "app=web,tier");
    }

    #[test]
    fn test_parse_prefixed_key_and_empty_value() {
        let selector = LabelSelector::parse("kyma-project.io/component=").unwrap();
        assert_eq!(
            selector.requirements(),
            &[Requirement::KeyEquals(
                "kyma-project.io/component".to_string(),
                String::new()
            )]
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(LabelSelector::parse(""), Err(SelectorError::Empty));
        assert_eq!(LabelSelector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(
            LabelSelector::parse("a,,b"),
            Err(SelectorError::EmptyTerm(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unsupported_operators() {
        for expr in ["test!=true", "!test", "env in (prod)", "a=b=c"] {
            assert!(
                matches!(
                    LabelSelector::parse(expr),
                    Err(SelectorError::UnsupportedOperator(_))
                ),
                "'{expr}' should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_invalid_key_and_value() {
        assert!(matches!(
            LabelSelector::parse("-bad=true"),
            Err(SelectorError::InvalidKey { .. })
        ));
        assert!(matches!(
            LabelSelector::parse("/name"),
            Err(SelectorError::InvalidKey { .. })
        ));
        assert!(matches!(
            LabelSelector::parse("Bad_Prefix/name"),
            Err(SelectorError::InvalidKey { .. })
        ));
        assert!(matches!(
            LabelSelector::parse("key=bad value"),
            Err(SelectorError::InvalidValue { .. })
        ));

        let long = "a".repeat(64);
        assert!(matches!(
            LabelSelector::parse(&format!("key={long}")),
            Err(SelectorError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_matches_presence_and_equality() {
        let has_other = LabelSelector::parse("other").unwrap();
        let test_true = LabelSelector::parse("test=true").unwrap();

        assert!(has_other.matches(&labels(&[("other", "123")])));
        assert!(!has_other.matches(&labels(&[("test", "true")])));
        assert!(test_true.matches(&labels(&[("test", "true")])));
        assert!(!test_true.matches(&labels(&[("test", "false")])));
        assert!(!test_true.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_matches_requires_all_terms() {
        let selector = LabelSelector::parse("app=web,tier").unwrap();

        assert!(selector.matches(&labels(&[("app", "web"), ("tier", "frontend")])));
        assert!(!selector.matches(&labels(&[("app", "web")])));
        assert!(!selector.matches(&labels(&[("app", "api"), ("tier", "frontend")])));
    }

    #[test]
    fn test_from_str() {
        let selector: LabelSelector = "test=true".parse().unwrap();
        assert_eq!(selector.requirements()[0].key(), "test");
    }
}
