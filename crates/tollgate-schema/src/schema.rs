//! The schema seam.
//!
//! Tollgate never inspects a schema's internals. It asks a schema two things:
//! whether a key is declared (for strict admission) and whether a record is
//! valid. Any validation library can be plugged in by implementing
//! [`Schema`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ValidationFailure;

/// A boxed future, as used by schemas and middleware.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A flat, insertion-ordered mapping from field name to value.
pub type Record = IndexMap<String, Value>;

/// A shared, type-erased schema.
pub type SchemaRef = Arc<dyn Schema>;

/// Options passed to [`Schema::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Accept keys the schema does not declare.
    pub allow_unknown: bool,
    /// Coerce textual values to the declared type before checking.
    pub convert: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            allow_unknown: false,
            convert: true,
        }
    }
}

/// A description of expected fields and constraints.
///
/// # Invariants
///
/// - `validate` produces exactly one outcome per call
/// - the `Ok` record holds the same keys as the input; values may be converted
pub trait Schema: Send + Sync + fmt::Debug {
    /// Returns true if the schema declares `key`.
    fn declares(&self, key: &str) -> bool;

    /// Validates `record`, returning the (possibly converted) record.
    ///
    /// The returned future may complete asynchronously; callers must not
    /// continue processing the request until it resolves.
    fn validate<'a>(
        &'a self,
        record: Record,
        options: &'a ValidateOptions,
    ) -> BoxFuture<'a, Result<Record, ValidationFailure>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    /// A schema that accepts declared keys only when their values are non-null.
    #[derive(Debug)]
    struct NonNullSchema {
        keys: HashSet<&'static str>,
    }

    impl Schema for NonNullSchema {
        fn declares(&self, key: &str) -> bool {
            self.keys.contains(key)
        }

        fn validate<'a>(
            &'a self,
            record: Record,
            options: &'a ValidateOptions,
        ) -> BoxFuture<'a, Result<Record, ValidationFailure>> {
            Box::pin(async move {
                // Yield once so the outcome really is produced asynchronously.
                tokio::task::yield_now().await;
                for (key, value) in &record {
                    if !self.declares(key) && !options.allow_unknown {
                        return Err(ValidationFailure::for_key(key, "unknown"));
                    }
                    if value.is_null() {
                        return Err(ValidationFailure::for_key(key, "null"));
                    }
                }
                Ok(record)
            })
        }
    }

    fn schema() -> SchemaRef {
        Arc::new(NonNullSchema {
            keys: ["id"].into_iter().collect(),
        })
    }

    #[tokio::test]
    async fn test_async_schema_through_trait_object() {
        let schema = schema();
        let mut record = Record::new();
        record.insert("id".to_string(), json!("42"));

        let validated = schema
            .validate(record.clone(), &ValidateOptions::default())
            .await
            .unwrap();
        assert_eq!(validated, record);
    }

    #[tokio::test]
    async fn test_unknown_key_respects_options() {
        let schema = schema();
        let mut record = Record::new();
        record.insert("other".to_string(), json!(1));

        let strict = ValidateOptions::default();
        assert!(schema.validate(record.clone(), &strict).await.is_err());

        let lax = ValidateOptions {
            allow_unknown: true,
            ..ValidateOptions::default()
        };
        assert!(schema.validate(record, &lax).await.is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = ValidateOptions::default();
        assert!(!options.allow_unknown);
        assert!(options.convert);
    }

    #[test]
    fn test_declares() {
        assert!(schema().declares("id"));
        assert!(!schema().declares("name"));
    }
}
