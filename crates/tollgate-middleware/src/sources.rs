//! Per-request data sources.
//!
//! Validation reads three sources from a request:
//!
//! | Source | Where it comes from                                  |
//! |--------|------------------------------------------------------|
//! | params | [`RouteMatch`] extension, set by the upstream router  |
//! | query  | the request URI                                      |
//! | body   | [`ParsedBody`] extension, set by a body parser stage  |
//!
//! Routing itself happens upstream; Tollgate only consumes its result.

use serde_json::Value;
use tollgate_schema::Record;

use crate::types::Request;

/// The route an upstream router matched, with its captured parameters.
///
/// Insert it into the request extensions before the validation stage runs.
///
/// ```
/// use tollgate_middleware::RouteMatch;
///
/// let matched = RouteMatch::new("/users/:id").param("id", "42");
/// assert_eq!(matched.path, "/users/:id");
/// assert_eq!(matched.params["id"], "42");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMatch {
    /// The matched route pattern (e.g. `/users/:id`).
    pub path: String,
    /// Captured path parameters.
    pub params: Record,
}

impl RouteMatch {
    /// Creates a match for a route pattern with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Record::new(),
        }
    }

    /// Adds a captured parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), Value::String(value.into()));
        self
    }
}

/// A parsed request body, stored as a request extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody(pub Record);

/// The three sources of a request, extracted once per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSources {
    /// Path parameters.
    pub params: Record,
    /// Query-string parameters.
    pub query: Record,
    /// Parsed body fields, if a body parser ran.
    pub body: Option<Record>,
}

impl RequestSources {
    /// Extracts all sources from a request.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        let extensions = request.extensions();
        Self {
            params: extensions
                .get::<RouteMatch>()
                .map(|m| m.params.clone())
                .unwrap_or_default(),
            query: request.uri().query().map(parse_query).unwrap_or_default(),
            body: extensions.get::<ParsedBody>().map(|b| b.0.clone()),
        }
    }
}

/// Returns the path used for route-table lookup.
///
/// This is the matched route pattern when a router ran, otherwise the raw
/// URI path.
#[must_use]
pub fn route_path(request: &Request) -> &str {
    request
        .extensions()
        .get::<RouteMatch>()
        .map_or_else(|| request.uri().path(), |m| m.path.as_str())
}

/// Parses a raw query string.
///
/// Keys and values are form-decoded (`+` becomes a space). A key that
/// appears more than once collects its values into an array. Pairs with an
/// empty key are skipped.
#[must_use]
pub fn parse_query(query: &str) -> Record {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparseable query string");
            return Record::new();
        }
    };

    let mut record = Record::new();
    for (key, value) in pairs.into_iter().filter(|(key, _)| !key.is_empty()) {
        insert_repeated(&mut record, key, Value::String(value));
    }
    record
}

/// Inserts `value`, collecting repeated keys into an array.
pub(crate) fn insert_repeated(record: &mut Record, key: String, value: Value) {
    match record.get_mut(&key) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            record.insert(key, value);
        }
    }
}
