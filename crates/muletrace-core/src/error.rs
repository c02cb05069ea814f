//! Error types for the muletrace engine.

use thiserror::Error;

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during an analysis run.
///
/// Detection-level soft failures (a candidate rejected by a temporal,
/// pass-through, or dedup check) are not errors and never surface here;
/// detectors simply drop the candidate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input transaction sequence was empty.
    #[error("No transactions to analyze")]
    EmptyInput,

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    ValidationError(String),

    /// Unexpected violation of an internal invariant. Fatal to the run.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EngineError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::ValidationError(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::InternalError(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::ConfigError(msg.into())
    }

    /// Returns true if this error is caused by the input rather than the
    /// engine itself.
    #[must_use]
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyInput | EngineError::ValidationError(_)
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}
