//! The merge stage.
//!
//! Combines path parameters, query, and body into one flat record. Sources
//! are visited in that order and later sources overwrite earlier ones. Body
//! fields are ignored for `GET` and `DELETE`.
//!
//! Under strict admission, keys the schema does not declare are diverted into
//! per-source [`Extras`] with their raw values. They never reach the schema
//! and are restored into the record once validation passes.

use std::borrow::Cow;

use http::Method;
use serde_json::Value;
use tollgate_schema::{Record, Schema};

use crate::sources::RequestSources;

/// Merge flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Divert undeclared keys into extras.
    pub strict: bool,
    /// Percent-decode admitted string values.
    pub decode: bool,
}

/// Undeclared keys held aside during strict admission, per source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extras {
    /// Undeclared path parameters.
    pub params: Record,
    /// Undeclared query parameters.
    pub query: Record,
    /// Undeclared body fields.
    pub body: Record,
}

impl Extras {
    /// Returns true if no key was diverted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.query.is_empty() && self.body.is_empty()
    }

    /// Returns the number of diverted keys across all sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len() + self.query.len() + self.body.len()
    }

    /// Restores every diverted key into `items`, in source order.
    pub fn restore_into(self, items: &mut Record) {
        for (key, value) in self.params.into_iter().chain(self.query).chain(self.body) {
            items.insert(key, value);
        }
    }
}

/// Output of [`merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    /// The admitted record, to be validated.
    pub items: Record,
    /// Keys diverted under strict admission.
    pub extras: Extras,
}

/// Returns true if body fields take part in the merge for `method`.
#[must_use]
pub fn merges_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::DELETE
}

/// Merges request sources into one record.
///
/// A key is admitted when admission is lax, when no schema is supplied, or
/// when the schema declares it.
#[must_use]
pub fn merge(
    sources: &RequestSources,
    method: &Method,
    schema: Option<&dyn Schema>,
    options: MergeOptions,
) -> Merged {
    let mut merged = Merged::default();

    let admit = |key: &str| !options.strict || schema.map_or(true, |s| s.declares(key));

    let mut take = |source: &Record, extras: &mut Record| {
        for (key, value) in source {
            if admit(key) {
                let value = if options.decode {
                    decode_value(value)
                } else {
                    value.clone()
                };
                merged.items.insert(key.clone(), value);
            } else {
                extras.insert(key.clone(), value.clone());
            }
        }
    };

    let mut extras = Extras::default();
    take(&sources.params, &mut extras.params);
    take(&sources.query, &mut extras.query);
    if merges_body(method) {
        if let Some(body) = &sources.body {
            take(body, &mut extras.body);
        }
    }

    merged.extras = extras;
    merged
}

/// Percent-decodes string values, including strings inside arrays.
///
/// Malformed sequences keep the raw value.
fn decode_value(value: &Value) -> Value {
    match value {
        Value::String(raw) => Value::String(decode_str(raw).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(decode_value).collect()),
        other => other.clone(),
    }
}

fn decode_str(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}
