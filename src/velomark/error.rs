//! Error types for the conformance harness
//!
//! [`HarnessError`] covers everything that can stop a scenario from producing
//! a passing verdict. [`EngineError`] is raised inside a running job by query
//! operators, sinks and sources, and surfaces to the harness as
//! [`HarnessError::EngineFailure`].

use std::fmt;

/// Main error type for harness operations
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Configuration rejected before any run started
    InvalidConfiguration {
        message: String,
        field: Option<String>,
    },

    /// Failed to parse a configuration file
    ConfigParseError { message: String, file: String },

    /// Execution context terminated abnormally
    EngineFailure {
        message: String,
        query_name: String,
        source: Option<String>,
    },

    /// Completion or quiescence not reached within the bound
    Timeout {
        message: String,
        operation: String,
        timeout_ms: u64,
    },

    /// Model predicate rejected the observed collection
    AssertionMismatch {
        message: String,
        expected: String,
        actual: String,
    },

    /// Two registry entries share a name
    DuplicateScenario { name: String },

    /// Scenario state machine violation
    InvalidStateTransition {
        scenario: String,
        from: String,
        to: String,
    },

    /// IO error (file operations)
    IoError { message: String, path: String },
}

impl HarnessError {
    /// Shorthand for a configuration error on a named field
    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        HarnessError::InvalidConfiguration {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidConfiguration { message, field } => {
                if let Some(field) = field {
                    write!(f, "Invalid configuration '{}': {}", field, message)
                } else {
                    write!(f, "Invalid configuration: {}", message)
                }
            }
            HarnessError::ConfigParseError { message, file } => {
                write!(f, "Config parse error in {}: {}", file, message)
            }
            HarnessError::EngineFailure {
                message,
                query_name,
                source,
            } => {
                if let Some(s) = source {
                    write!(
                        f,
                        "Engine failure in query '{}': {} ({})",
                        query_name, message, s
                    )
                } else {
                    write!(f, "Engine failure in query '{}': {}", query_name, message)
                }
            }
            HarnessError::Timeout {
                message,
                operation,
                timeout_ms,
            } => {
                write!(
                    f,
                    "Timeout after {}ms during '{}': {}",
                    timeout_ms, operation, message
                )
            }
            HarnessError::AssertionMismatch {
                message,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Assertion mismatch: {} (expected: {}, actual: {})",
                    message, expected, actual
                )
            }
            HarnessError::DuplicateScenario { name } => {
                write!(f, "Scenario '{}' is already registered", name)
            }
            HarnessError::InvalidStateTransition { scenario, from, to } => {
                write!(
                    f,
                    "Scenario '{}' cannot move from {} to {}",
                    scenario, from, to
                )
            }
            HarnessError::IoError { message, path } => {
                write!(f, "IO error for '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for HarnessError {}

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised while a job is running
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("operator '{operator}' failed: {message}")]
    OperatorFailed { operator: String, message: String },

    #[error("result sink poisoned: {0}")]
    SinkPoisoned(String),

    #[error("source closed unexpectedly: {0}")]
    SourceClosed(String),

    #[error("job panicked: {0}")]
    Panicked(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
