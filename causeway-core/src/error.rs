//! Error types for causeway operations
//!
//! Validation and reconciliation report defects as issues and never fail.
//! These errors cover the boundary: configuration, loading graphs and
//! rendering results.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },

    #[error("Failed to parse configuration: {reason}")]
    ParseFailed { reason: String },
}

/// Errors loading a graph or constraint list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphLoadError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed graph JSON at line {line}, column {column}: {reason}")]
    Malformed {
        line: usize,
        column: usize,
        reason: String,
    },
}

impl From<serde_json::Error> for GraphLoadError {
    fn from(err: serde_json::Error) -> Self {
        GraphLoadError::Malformed {
            line: err.line(),
            column: err.column(),
            reason: err.to_string(),
        }
    }
}

/// Master error type for all causeway errors.
#[derive(Debug, Clone, Error)]
pub enum CausewayError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] GraphLoadError),

    #[error("Output error: {reason}")]
    Output { reason: String },
}

/// Result type alias for causeway operations.
pub type CausewayResult<T> = Result<T, CausewayError>;

// =============================================================================
// TESTS
// =============================================================================
