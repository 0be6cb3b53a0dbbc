//! Validation metrics.
//!
//! Metrics go through the `metrics` facade; installing an exporter is left to
//! the application.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tollgate_validations_total` | Counter | `outcome` | Validation decisions |
//!
//! Outcomes are `passed`, `rejected`, `skipped` (disabled or unconfigured
//! route in lax mode) and `misconfigured` (unconfigured route in strict
//! mode).

use metrics::{counter, describe_counter};

/// Name of the validation counter.
pub const VALIDATIONS_TOTAL: &str = "tollgate_validations_total";

/// How a request left the validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationOutcome {
    /// The schema accepted the record.
    Passed,
    /// The schema rejected the record.
    Rejected,
    /// No validation ran; the request continued.
    Skipped,
    /// No validation configuration; the request was failed.
    Misconfigured,
}

impl ValidationOutcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Rejected => "rejected",
            Self::Skipped => "skipped",
            Self::Misconfigured => "misconfigured",
        }
    }
}

/// Registers descriptions for all Tollgate metrics.
pub fn describe_metrics() {
    describe_counter!(VALIDATIONS_TOTAL, "Total validation decisions by outcome");
}

/// Records one validation decision.
pub fn record_validation(outcome: ValidationOutcome) {
    counter!(VALIDATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}
