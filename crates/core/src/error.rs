//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The variants map one-to-one onto how a caller should react:
///
/// - `Validation`: bad input to a pure calculation; the user corrects it.
/// - `NotFound`: no catalog path matches; the user changes a selection. The
///   `alternatives` are the values that *are* valid at the point of failure.
/// - `Configuration`: a data or settings gap. Fatal at startup, or fatal for
///   the current request when only discovered while resolving.
/// - `Transient`: the external price service could not answer. The caller may
///   retry; nothing in the domain layer retries on its own.
/// - `Cancelled`: the caller aborted an in-flight request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. impossible geometry).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A catalog lookup matched nothing.
    #[error("not found: {what}")]
    NotFound {
        what: String,
        alternatives: Vec<String>,
    },

    /// Missing or malformed configuration/reference data.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The external collaborator failed; safe to retry.
    #[error("temporarily unavailable: {0}")]
    Transient(String),

    /// The request was cancelled by the caller.
    #[error("cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            alternatives,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Only transient failures are worth re-invoking with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Valid alternatives at the point of failure, when the error came from the catalog.
    pub fn alternatives(&self) -> &[String] {
        match self {
            Self::NotFound { alternatives, .. } => alternatives,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(DomainError::transient("timeout").is_retryable());
        assert!(!DomainError::validation("bad").is_retryable());
        assert!(!DomainError::configuration("missing density").is_retryable());
        assert!(!DomainError::not_found("sku", vec![]).is_retryable());
        assert!(!DomainError::Cancelled.is_retryable());
    }

    #[test]
    fn not_found_exposes_alternatives() {
        let err = DomainError::not_found("Flat / 14K Yellow", vec!["2 Mm".into(), "3 Mm".into()]);
        assert_eq!(err.alternatives(), ["2 Mm".to_string(), "3 Mm".to_string()]);
        assert!(DomainError::Cancelled.alternatives().is_empty());
    }
}
