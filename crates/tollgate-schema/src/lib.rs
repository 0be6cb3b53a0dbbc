//! # Tollgate Schema
//!
//! The schema seam used by the Tollgate validation middleware.
//!
//! Tollgate merges the route parameters, query string, and body of a request
//! into one flat [`Record`] and hands it to a [`Schema`]. The schema either
//! accepts the record (possibly converting values) or rejects it with a
//! [`ValidationFailure`] whose message is sent to the client.
//!
//! ## Bundled Validator
//!
//! [`ObjectSchema`] covers the common cases of query and form validation:
//!
//! ```
//! use serde_json::json;
//! use tollgate_schema::{Field, ObjectSchema, Record, ValidateOptions};
//!
//! let schema = ObjectSchema::new()
//!     .key("limit", Field::integer().min(1).max(25))
//!     .key("name", Field::string().alphanum().min(2).max(25));
//!
//! let mut record = Record::new();
//! record.insert("limit".to_string(), json!("-1"));
//!
//! let err = schema.check(record, &ValidateOptions::default()).unwrap_err();
//! assert_eq!(err.message, "the value of limit must be larger than or equal to 1");
//! ```
//!
//! ## Custom Validators
//!
//! Implement [`Schema`] to plug in another validation library. Validation is
//! asynchronous so schemas may consult external state.

#![doc(html_root_url = "https://docs.rs/tollgate-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod object;
pub mod schema;

pub use error::{ValidationFailure, ValidationResult};
pub use object::{Field, FieldKind, ObjectSchema, Pattern};
pub use schema::{BoxFuture, Record, Schema, SchemaRef, ValidateOptions};
