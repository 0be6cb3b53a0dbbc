//! Bundled object schema.
//!
//! [`ObjectSchema`] is a small Joi-flavoured validator for flat records. It is
//! deliberately modest: typed keys, numeric bounds, string length, alphanumeric
//! and regex checks. Anything richer belongs in a dedicated validation library
//! behind the [`Schema`] trait.
//!
//! Schemas are serde-deserializable so they can be declared in configuration:
//!
//! ```toml
//! [keys.limit]
//! type = "integer"
//! min = 1
//! max = 25
//!
//! [keys.name]
//! type = "string"
//! alphanum = true
//! required = true
//! ```

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{ValidationFailure, ValidationResult};
use crate::schema::{BoxFuture, Record, Schema, ValidateOptions};

/// A schema for a flat record of named fields.
///
/// Keys are optional unless marked [`Field::required`]. Validation stops at
/// the first failure.
///
/// # Example
///
/// ```
/// use tollgate_schema::{Field, ObjectSchema};
///
/// let schema = ObjectSchema::new()
///     .key("limit", Field::integer().min(1).max(25))
///     .key("offset", Field::integer().min(0).max(25))
///     .key("name", Field::string().alphanum().min(2).max(25));
///
/// assert_eq!(schema.len(), 3);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSchema {
    /// Declared keys, in declaration order.
    #[serde(default)]
    keys: IndexMap<String, Field>,
}

/// A single declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// The field type and its constraints.
    #[serde(flatten)]
    kind: FieldKind,
    /// Whether the key must be present.
    #[serde(default)]
    required: bool,
}

/// Field types and their constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// A string, optionally length-bounded.
    String {
        /// Minimum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        /// Maximum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
        /// Only ASCII letters and digits.
        #[serde(default)]
        alphanum: bool,
        /// Regular expression the value must match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<Pattern>,
    },
    /// A whole number.
    Integer {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// Any finite number.
    Number {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// `true` or `false`.
    Boolean,
    /// Any value (no checks).
    Any,
}

/// A compiled regular expression that round-trips through its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.0.as_str()).finish()
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::try_from(source).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ObjectSchema
// ============================================================================

impl ObjectSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a key.
    ///
    /// Declaring the same key twice replaces the earlier field.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, field: Field) -> Self {
        self.keys.insert(name.into(), field);
        self
    }

    /// Returns the field declared for `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.keys.get(name)
    }

    /// Returns the declared key names in declaration order.
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Returns the number of declared keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validates a record synchronously.
    ///
    /// Declared keys are checked in declaration order, then undeclared keys
    /// are checked in record order. The returned record keeps the input's key
    /// order.
    pub fn check(&self, record: Record, options: &ValidateOptions) -> ValidationResult<Record> {
        let mut converted: IndexMap<&str, Value> = IndexMap::with_capacity(self.keys.len());

        for (key, field) in &self.keys {
            match record.get(key) {
                Some(value) => {
                    converted.insert(key.as_str(), field.check(key, value, options.convert)?);
                }
                None if field.required => {
                    return Err(ValidationFailure::for_key(
                        key,
                        format!("the value of {key} is not allowed to be undefined"),
                    ));
                }
                None => {}
            }
        }

        let mut validated = Record::with_capacity(record.len());
        for (key, value) in record {
            if let Some(value) = converted.swap_remove(key.as_str()) {
                validated.insert(key, value);
            } else if options.allow_unknown {
                validated.insert(key, value);
            } else {
                return Err(ValidationFailure::for_key(
                    &key,
                    format!("the key {key} is not allowed"),
                ));
            }
        }

        Ok(validated)
    }
}

impl Schema for ObjectSchema {
    fn declares(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    fn validate<'a>(
        &'a self,
        record: Record,
        options: &'a ValidateOptions,
    ) -> BoxFuture<'a, Result<Record, ValidationFailure>> {
        let outcome = self.check(record, options);
        if let Err(failure) = &outcome {
            debug!(key = ?failure.key, message = %failure.message, "record rejected");
        }
        Box::pin(std::future::ready(outcome))
    }
}

// ============================================================================
// Field
// ============================================================================

impl Field {
    /// A string field.
    #[must_use]
    pub fn string() -> Self {
        Self::of(FieldKind::String {
            min: None,
            max: None,
            alphanum: false,
            pattern: None,
        })
    }

    /// An integer field.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(FieldKind::Integer { min: None, max: None })
    }

    /// A number field.
    #[must_use]
    pub fn number() -> Self {
        Self::of(FieldKind::Number { min: None, max: None })
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    /// A field that accepts any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(FieldKind::Any)
    }

    const fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// Marks the key as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the lower bound: minimum length for strings, minimum value for
    /// numbers. Ignored for other types.
    #[must_use]
    pub fn min(mut self, bound: i64) -> Self {
        match &mut self.kind {
            FieldKind::String { min, .. } => *min = Some(usize::try_from(bound).unwrap_or(0)),
            FieldKind::Integer { min, .. } => *min = Some(bound),
            FieldKind::Number { min, .. } => *min = Some(bound as f64),
            FieldKind::Boolean | FieldKind::Any => {}
        }
        self
    }

    /// Sets the upper bound: maximum length for strings, maximum value for
    /// numbers. Ignored for other types.
    #[must_use]
    pub fn max(mut self, bound: i64) -> Self {
        match &mut self.kind {
            FieldKind::String { max, .. } => *max = Some(usize::try_from(bound).unwrap_or(0)),
            FieldKind::Integer { max, .. } => *max = Some(bound),
            FieldKind::Number { max, .. } => *max = Some(bound as f64),
            FieldKind::Boolean | FieldKind::Any => {}
        }
        self
    }

    /// Restricts a string to ASCII letters and digits.
    #[must_use]
    pub fn alphanum(mut self) -> Self {
        if let FieldKind::String { alphanum, .. } = &mut self.kind {
            *alphanum = true;
        }
        self
    }

    /// Requires a string to match `pattern`.
    #[must_use]
    pub fn pattern(mut self, regex: Pattern) -> Self {
        if let FieldKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(regex);
        }
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns true if the key is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Checks one value, returning it converted to the declared type.
    fn check(&self, key: &str, value: &Value, convert: bool) -> ValidationResult<Value> {
        match &self.kind {
            FieldKind::String {
                min,
                max,
                alphanum,
                pattern,
            } => {
                let Value::String(text) = value else {
                    return Err(fail(key, format!("the value of {key} must be a string")));
                };
                if text.is_empty() {
                    return Err(fail(key, format!("the value of {key} is not allowed to be empty")));
                }
                if *alphanum && !text.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(fail(
                        key,
                        format!("the value of {key} must only contain alpha-numeric characters"),
                    ));
                }
                let length = text.chars().count();
                if let Some(min) = min {
                    if length < *min {
                        return Err(fail(
                            key,
                            format!("the length of {key} must be at least {min} characters long"),
                        ));
                    }
                }
                if let Some(max) = max {
                    if length > *max {
                        return Err(fail(
                            key,
                            format!(
                                "the length of {key} must be less than or equal to {max} characters long"
                            ),
                        ));
                    }
                }
                if let Some(pattern) = pattern {
                    if !pattern.0.is_match(text) {
                        return Err(fail(
                            key,
                            format!(
                                "the value of {key} must match the regular expression {}",
                                pattern.as_str()
                            ),
                        ));
                    }
                }
                Ok(value.clone())
            }
            FieldKind::Integer { min, max } => {
                let number = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) if convert => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| fail(key, format!("the value of {key} must be an integer")))?;

                check_bounds(key, number, *min, *max)?;
                Ok(Value::from(number))
            }
            FieldKind::Number { min, max } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) if convert => {
                        s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
                    }
                    _ => None,
                }
                .ok_or_else(|| fail(key, format!("the value of {key} must be a number")))?;

                check_bounds(key, number, *min, *max)?;
                match value {
                    Value::Number(_) => Ok(value.clone()),
                    _ => Ok(number_value(number)),
                }
            }
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) if convert && s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if convert && s == "false" => Ok(Value::Bool(false)),
                _ => Err(fail(key, format!("the value of {key} must be a boolean"))),
            },
            FieldKind::Any => Ok(value.clone()),
        }
    }
}

fn fail(key: &str, message: String) -> ValidationFailure {
    ValidationFailure::for_key(key, message)
}

fn check_bounds<T>(key: &str, value: T, min: Option<T>, max: Option<T>) -> ValidationResult<()>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if let Some(min) = min {
        if value < min {
            return Err(fail(
                key,
                format!("the value of {key} must be larger than or equal to {min}"),
            ));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(fail(
                key,
                format!("the value of {key} must be less than or equal to {max}"),
            ));
        }
    }
    Ok(())
}

fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        Value::from(number as i64)
    } else {
        Number::from_f64(number).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users_schema() -> ObjectSchema {
        ObjectSchema::new()
            .key("limit", Field::integer().min(1).max(25))
            .key("offset", Field::integer().min(0).max(25))
            .key("name", Field::string().alphanum().min(2).max(25))
    }

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_query_strings_are_converted() {
        let validated = users_schema()
            .check(
                record(json!({"limit": "5", "offset": "5", "name": "tom"})),
                &ValidateOptions::default(),
            )
            .unwrap();

        assert_eq!(validated["limit"], json!(5));
        assert_eq!(validated["offset"], json!(5));
        assert_eq!(validated["name"], json!("tom"));
    }

    #[test]
    fn test_lower_bound_message() {
        let err = users_schema()
            .check(
                record(json!({"limit": "-1", "offset": "5", "name": "tom"})),
                &ValidateOptions::default(),
            )
            .unwrap_err();

        assert_eq!(
            err.message,
            "the value of limit must be larger than or equal to 1"
        );
        assert_eq!(err.key.as_deref(), Some("limit"));
    }

    #[test]
    fn test_upper_bound_message() {
        let err = users_schema()
            .check(record(json!({"offset": 26})), &ValidateOptions::default())
            .unwrap_err();
        assert_eq!(
            err.message,
            "the value of offset must be less than or equal to 25"
        );
    }

    #[test]
    fn test_keys_are_optional_by_default() {
        let validated = users_schema()
            .check(record(json!({"name": "tom"})), &ValidateOptions::default())
            .unwrap();
        assert_eq!(validated.len(), 1);
    }

    #[test]
    fn test_required_key_missing() {
        let schema = ObjectSchema::new().key("id", Field::string().required());
        let err = schema
            .check(Record::new(), &ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.message, "the value of id is not allowed to be undefined");
    }

    #[test]
    fn test_unknown_key_rejected_unless_allowed() {
        let input = record(json!({"foo": "bar", "name": "tom"}));

        let err = users_schema()
            .check(input.clone(), &ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.message, "the key foo is not allowed");

        let options = ValidateOptions {
            allow_unknown: true,
            convert: true,
        };
        let validated = users_schema().check(input, &options).unwrap();
        assert_eq!(validated["foo"], json!("bar"));
        // Input order is preserved.
        assert_eq!(validated.keys().collect::<Vec<_>>(), ["foo", "name"]);
    }

    #[test]
    fn test_declared_key_errors_come_before_unknown_keys() {
        let err = users_schema()
            .check(
                record(json!({"foo": "bar", "limit": "0"})),
                &ValidateOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.key.as_deref(), Some("limit"));
    }

    #[test]
    fn test_conversion_can_be_disabled() {
        let options = ValidateOptions {
            allow_unknown: false,
            convert: false,
        };
        let err = users_schema()
            .check(record(json!({"limit": "5"})), &options)
            .unwrap_err();
        assert_eq!(err.message, "the value of limit must be an integer");
    }

    #[test]
    fn test_string_rules() {
        let schema = users_schema();
        let options = ValidateOptions::default();

        let err = schema.check(record(json!({"name": "t"})), &options).unwrap_err();
        assert_eq!(err.message, "the length of name must be at least 2 characters long");

        let err = schema
            .check(record(json!({"name": "tom smith"})), &options)
            .unwrap_err();
        assert_eq!(
            err.message,
            "the value of name must only contain alpha-numeric characters"
        );

        let err = schema.check(record(json!({"name": 12})), &options).unwrap_err();
        assert_eq!(err.message, "the value of name must be a string");

        let err = schema.check(record(json!({"name": ""})), &options).unwrap_err();
        assert_eq!(err.message, "the value of name is not allowed to be empty");
    }

    #[test]
    fn test_pattern_rule() {
        let schema = ObjectSchema::new().key(
            "code",
            Field::string().pattern(Pattern::new("^[A-Z]{3}$").unwrap()),
        );
        let options = ValidateOptions::default();

        assert!(schema.check(record(json!({"code": "ABC"})), &options).is_ok());
        let err = schema
            .check(record(json!({"code": "abc"})), &options)
            .unwrap_err();
        assert_eq!(
            err.message,
            "the value of code must match the regular expression ^[A-Z]{3}$"
        );
    }

    #[test]
    fn test_number_and_boolean_conversion() {
        let schema = ObjectSchema::new()
            .key("ratio", Field::number().min(0).max(1))
            .key("active", Field::boolean());
        let validated = schema
            .check(
                record(json!({"ratio": "0.5", "active": "true"})),
                &ValidateOptions::default(),
            )
            .unwrap();

        assert_eq!(validated["ratio"], json!(0.5));
        assert_eq!(validated["active"], json!(true));

        let err = schema
            .check(record(json!({"ratio": "1.5"})), &ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.message, "the value of ratio must be less than or equal to 1");

        let err = schema
            .check(record(json!({"active": "yes"})), &ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.message, "the value of active must be a boolean");
    }

    #[test]
    fn test_any_accepts_everything() {
        let schema = ObjectSchema::new().key("meta", Field::any());
        let validated = schema
            .check(record(json!({"meta": {"a": [1, 2]}})), &ValidateOptions::default())
            .unwrap();
        assert_eq!(validated["meta"], json!({"a": [1, 2]}));
    }

    #[test]
    fn test_declares() {
        let schema = users_schema();
        assert!(schema.declares("limit"));
        assert!(!schema.declares("foo"));
        assert_eq!(schema.key_names().collect::<Vec<_>>(), ["limit", "offset", "name"]);
    }

    #[test]
    fn test_validate_through_trait() {
        let schema = users_schema();
        let options = ValidateOptions::default();
        let outcome = tokio_test::block_on(
            schema.validate(record(json!({"limit": "30"})), &options),
        );
        assert_eq!(
            outcome.unwrap_err().message,
            "the value of limit must be less than or equal to 25"
        );
    }

    #[test]
    fn test_deserialize_from_document() {
        let schema: ObjectSchema = from_json(json!({
            "keys": {
                "limit": {"type": "integer", "min": 1, "max": 25},
                "name": {"type": "string", "alphanum": true, "required": true},
                "code": {"type": "string", "pattern": "^[a-z]+$"}
            }
        }));

        assert!(schema.field("name").unwrap().is_required());
        assert!(matches!(
            schema.field("limit").unwrap().kind(),
            FieldKind::Integer {
                min: Some(1),
                max: Some(25)
            }
        ));
        assert!(matches!(
            schema.field("code").unwrap().kind(),
            FieldKind::String { pattern: Some(_), .. }
        ));
    }

    #[test]
    fn test_invalid_pattern_fails_deserialization() {
        let result: Result<ObjectSchema, _> = serde_json::from_value(json!({
            "keys": {"code": {"type": "string", "pattern": "("}}
        }));
        assert!(result.is_err());
    }

    fn from_json(value: Value) -> ObjectSchema {
        serde_json::from_value(value).unwrap()
    }
}
