//! Error types for the validation middleware.
//!
//! [`TollgateError`] covers both construction-time problems (a conflicting or
//! incomplete route table) and request-time outcomes (a missing route entry,
//! a rejected record).
//!
//! | Kind                    | Raised                  | Default status |
//! |-------------------------|-------------------------|----------------|
//! | `ConfigurationConflict` | route table build       | 500            |
//! | `ConfigurationMissing`  | route table build, lookup | 500          |
//! | `ValidationFailure`     | schema rejected record  | 400            |

use http::{Method, StatusCode};
use thiserror::Error;
use tollgate_schema::ValidationFailure;

/// Result type alias using [`TollgateError`].
pub type TollgateResult<T> = Result<T, TollgateError>;

/// Errors raised by the validation middleware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TollgateError {
    /// The same `(path, method)` pair was registered twice.
    #[error("Validation already registered for {method}: {path}")]
    ConfigurationConflict {
        /// HTTP method of the duplicate registration.
        method: Method,
        /// Route path of the duplicate registration.
        path: String,
    },

    /// Required validation configuration is absent.
    #[error(transparent)]
    ConfigurationMissing(#[from] MissingConfiguration),

    /// The schema rejected the merged record.
    #[error(transparent)]
    ValidationFailure(#[from] ValidationFailure),
}

/// What configuration was missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingConfiguration {
    /// No route definition list was supplied.
    #[error("Route map given to loadRoutes undefined")]
    RouteMap,

    /// No entry exists for the matched route path.
    #[error("Validation not given for this path: {method}: {path}")]
    Path {
        /// Request method.
        method: Method,
        /// Matched route path.
        path: String,
    },

    /// The path is known but not for this method.
    #[error("Validation not given for this path method: {method}: {path}")]
    Method {
        /// Request method.
        method: Method,
        /// Matched route path.
        path: String,
    },

    /// An enabled route was declared without a schema.
    #[error("Validation enabled without a schema for {method}: {path}")]
    Schema {
        /// Declared method.
        method: Method,
        /// Declared path.
        path: String,
    },
}

impl TollgateError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            Self::ConfigurationConflict { .. } | Self::ConfigurationMissing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a stable code string for logs and error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationConflict { .. } => "CONFIGURATION_CONFLICT",
            Self::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            Self::ValidationFailure(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if this error describes a server-side misconfiguration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        !matches!(self, Self::ValidationFailure(_))
    }

    /// Creates a conflict error.
    pub fn conflict(method: Method, path: impl Into<String>) -> Self {
        Self::ConfigurationConflict {
            method,
            path: path.into(),
        }
    }
}
