//! Validator options.

use serde::{Deserialize, Serialize};

/// What to do when the schema rejects a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnInvalid {
    /// Answer `400 {"message": ...}` directly.
    #[default]
    Respond,
    /// Forward the failure to the pipeline's error handler.
    Forward,
}

/// Options shared by every validation middleware.
///
/// ```
/// use tollgate_middleware::{OnInvalid, ValidatorOptions};
///
/// let options = ValidatorOptions::default();
/// assert!(options.strict);
/// assert!(options.decode);
/// assert_eq!(options.on_invalid, OnInvalid::Respond);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    /// Admit only declared keys and treat missing configuration as an error.
    pub strict: bool,
    /// Percent-decode admitted string values before validation.
    pub decode: bool,
    /// Failure reporting style.
    pub on_invalid: OnInvalid,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            strict: true,
            decode: true,
            on_invalid: OnInvalid::Respond,
        }
    }
}

impl ValidatorOptions {
    /// Lax options: undeclared keys and unconfigured routes pass through.
    #[must_use]
    pub fn lax() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Sets strict admission.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets percent-decoding.
    #[must_use]
    pub fn decode(mut self, decode: bool) -> Self {
        self.decode = decode;
        self
    }

    /// Sets the failure reporting style.
    #[must_use]
    pub fn on_invalid(mut self, on_invalid: OnInvalid) -> Self {
        self.on_invalid = on_invalid;
        self
    }
}
