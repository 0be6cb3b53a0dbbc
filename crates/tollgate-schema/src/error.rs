//! Validation failure type.

use thiserror::Error;

/// Result type for schema validation.
pub type ValidationResult<T> = Result<T, ValidationFailure>;

/// A rejected record.
///
/// The `Display` output is the human-readable message verbatim, so it can be
/// written straight into a client-facing response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Human-readable message.
    pub message: String,
    /// The record key that failed, when the failure is tied to one.
    pub key: Option<String>,
}

impl ValidationFailure {
    /// Creates a failure that is not tied to a specific key.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
        }
    }

    /// Creates a failure for a specific key.
    pub fn for_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
