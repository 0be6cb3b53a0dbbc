//! Observability for Tollgate.
//!
//! - **Logging**: structured logging via `tracing-subscriber`
//! - **Metrics**: validation counters via the `metrics` facade
//!
//! Tollgate crates emit events with `tracing` macros regardless of whether a
//! subscriber is installed. Applications that already configure `tracing`
//! can skip [`init_logging`] entirely.
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_telemetry::{describe_metrics, init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! describe_metrics();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, record_validation, ValidationOutcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
