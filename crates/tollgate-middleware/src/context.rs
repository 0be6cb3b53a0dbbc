//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline.
//! Validation stages attach the merged record here as `items`; handlers read
//! it back.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tollgate_schema::Record;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tollgate_middleware::context::MiddlewareContext;
/// use tollgate_schema::Record;
///
/// let mut ctx = MiddlewareContext::new();
/// assert!(ctx.items().is_none());
///
/// let mut items = Record::new();
/// items.insert("limit".to_string(), json!(5));
/// ctx.set_items(items);
///
/// assert_eq!(ctx.item("limit"), Some(&json!(5)));
/// ```
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// The merged, validated record.
    items: Option<Record>,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            items: None,
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the merged record, if a validation stage attached one.
    #[must_use]
    pub fn items(&self) -> Option<&Record> {
        self.items.as_ref()
    }

    /// Returns one field of the merged record.
    #[must_use]
    pub fn item(&self, key: &str) -> Option<&Value> {
        self.items.as_ref().and_then(|items| items.get(key))
    }

    /// Attaches the merged record, replacing any earlier one.
    pub fn set_items(&mut self, items: Record) {
        self.items = Some(items);
    }

    /// Removes and returns the merged record.
    pub fn take_items(&mut self) -> Option<Record> {
        self.items.take()
    }

    /// Stores a typed extension value.
    ///
    /// ```
    /// use tollgate_middleware::context::MiddlewareContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme"));
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiddlewareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareContext")
            .field("request_id", &self.request_id)
            .field("items", &self.items)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
