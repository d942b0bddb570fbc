//! Error types for the dq-scan library.
//!
//! Errors fall into two groups. `Config` and `SourceUnavailable` are fatal:
//! they abort a scan before any rule is evaluated. `Expression` errors are
//! recovered per rule: the affected rule is reported as errored and the
//! remaining rules still run. `Cancelled` marks a run that was cut short by
//! the caller's cancellation token or timeout.

use thiserror::Error;

/// The main error type for the dq-scan library.
#[derive(Error, Debug)]
pub enum DqError {
    /// A malformed rule document. Raised by the loader before evaluation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source table (or its filtered sample) could not be read.
    #[error("Source table '{table}' unavailable: {message}")]
    SourceUnavailable {
        /// Name of the table that could not be read
        table: String,
        /// Detailed error message
        message: String,
    },

    /// A SQL or regex expression failed to evaluate for a specific rule.
    ///
    /// This is recovered locally: the rule's outcome becomes `Errored` and
    /// other rules are unaffected.
    #[error("Expression error in rule {rule}: {message}")]
    Expression {
        /// Zero-based index of the rule whose expression failed
        rule: usize,
        /// Detailed error message
        message: String,
    },

    /// The scan run was cancelled before all rules completed.
    #[error("Scan cancelled before completion")]
    Cancelled,

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DqError>`.
pub type Result<T> = std::result::Result<T, DqError>;

impl DqError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a source-unavailable error for the given table.
    pub fn source_unavailable(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a per-rule expression error.
    pub fn expression(rule: usize, message: impl Into<String>) -> Self {
        Self::Expression {
            rule,
            message: message.into(),
        }
    }

    /// Returns true if this error aborts the whole run rather than a
    /// single rule.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DqError::Config(_) | DqError::SourceUnavailable { .. }
        )
    }
}

impl From<serde_yaml::Error> for DqError {
    fn from(err: serde_yaml::Error) -> Self {
        DqError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DqError {
    fn from(err: serde_json::Error) -> Self {
        DqError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DqError::config("bad rule").is_fatal());
        assert!(DqError::source_unavailable("orders", "not registered").is_fatal());
        assert!(!DqError::expression(3, "bad regex").is_fatal());
        assert!(!DqError::Cancelled.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = DqError::source_unavailable("orders", "table not found");
        assert_eq!(
            err.to_string(),
            "Source table 'orders' unavailable: table not found"
        );

        let err = DqError::expression(2, "regex failed to compile");
        assert!(err.to_string().contains("rule 2"));
    }
}
