//! Route table construction and lookup.
//!
//! A [`RouteTable`] maps `(path, method)` to a [`RouteEntry`]. It is built
//! once from a list of [`RouteDefinition`]s and never changes afterwards, so
//! one table can be shared by every request through an `Arc`.
//!
//! # Construction rules
//!
//! | Problem                       | strict                          | lax                |
//! |-------------------------------|---------------------------------|--------------------|
//! | definition list missing       | `ConfigurationMissing`          | warn, empty table  |
//! | duplicate `(path, method)`    | `ConfigurationConflict`         | warn, skip         |
//! | enabled route without schema  | `ConfigurationMissing`          | warn, skip         |
//!
//! The first registration of a pair always stays authoritative.

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use tollgate_schema::{Schema, SchemaRef};
use tracing::{debug, warn};

use crate::error::{MissingConfiguration, TollgateError, TollgateResult};

/// One route's validation declaration, as supplied by the caller.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    /// Route pattern, as matched by the upstream router.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// Whether requests to this route are validated.
    pub enabled: bool,
    /// Schema for enabled routes.
    pub schema: Option<SchemaRef>,
}

impl RouteDefinition {
    /// Declares an arbitrary definition.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        enabled: bool,
        schema: Option<SchemaRef>,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            enabled,
            schema,
        }
    }

    /// Declares a validated route.
    pub fn validated<S: Schema + 'static>(method: Method, path: impl Into<String>, schema: S) -> Self {
        Self::new(method, path, true, Some(Arc::new(schema)))
    }

    /// Declares a route that is merged but not validated.
    pub fn disabled(method: Method, path: impl Into<String>) -> Self {
        Self::new(method, path, false, None)
    }
}

/// A table row.
#[derive(Debug, Clone)]
pub enum RouteEntry {
    /// Merge only; no validation.
    Disabled,
    /// Validate with the schema.
    Enabled(SchemaRef),
}

/// The outcome of a table lookup.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Validate with this schema.
    Validate(&'a SchemaRef),
    /// Route declared, validation off.
    Disabled,
    /// No usable entry.
    Missing(MissingConfiguration),
}

/// An immutable `(path, method)` to [`RouteEntry`] mapping.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, IndexMap<Method, RouteEntry>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from a definition list.
    ///
    /// `None` stands for a missing list.
    ///
    /// # Example
    ///
    /// ```
    /// use http::Method;
    /// use tollgate_middleware::route_table::{RouteDefinition, RouteTable};
    /// use tollgate_schema::{Field, ObjectSchema};
    ///
    /// let schema = ObjectSchema::new().key("limit", Field::integer().min(1));
    /// let table = RouteTable::build(
    ///     Some(vec![
    ///         RouteDefinition::validated(Method::GET, "/users", schema.clone()),
    ///         RouteDefinition::validated(Method::GET, "/users", schema),
    ///     ]),
    ///     false,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn build(definitions: Option<Vec<RouteDefinition>>, strict: bool) -> TollgateResult<Self> {
        let Some(definitions) = definitions else {
            if strict {
                return Err(MissingConfiguration::RouteMap.into());
            }
            warn!("{}; no routes will be validated", MissingConfiguration::RouteMap);
            return Ok(Self::empty());
        };

        let mut table = Self::empty();
        for definition in definitions {
            table.add(definition, strict)?;
        }

        debug!(routes = table.len(), strict, "route table built");
        Ok(table)
    }

    fn add(&mut self, definition: RouteDefinition, strict: bool) -> TollgateResult<()> {
        let RouteDefinition {
            path,
            method,
            enabled,
            schema,
        } = definition;

        let duplicate = self
            .routes
            .get(&path)
            .is_some_and(|methods| methods.contains_key(&method));
        if duplicate {
            if strict {
                return Err(TollgateError::conflict(method, path));
            }
            warn!("Replacing validation for {method}: {path}; keeping the first registration");
            return Ok(());
        }

        let entry = match (enabled, schema) {
            (false, schema) => {
                if schema.is_some() {
                    debug!(%method, %path, "schema ignored for disabled route");
                }
                RouteEntry::Disabled
            }
            (true, Some(schema)) => RouteEntry::Enabled(schema),
            (true, None) => {
                let missing = MissingConfiguration::Schema { method, path };
                if strict {
                    return Err(missing.into());
                }
                warn!("{missing}; route skipped");
                return Ok(());
            }
        };

        let methods = self.routes.entry(path).or_default();
        methods.insert(method, entry);
        Ok(())
    }

    /// Looks up the entry for a matched route path and request method.
    #[must_use]
    pub fn resolve(&self, path: &str, method: &Method) -> Resolution<'_> {
        let Some(methods) = self.routes.get(path) else {
            return Resolution::Missing(MissingConfiguration::Path {
                method: method.clone(),
                path: path.to_string(),
            });
        };

        match methods.get(method) {
            Some(RouteEntry::Enabled(schema)) => Resolution::Validate(schema),
            Some(RouteEntry::Disabled) => Resolution::Disabled,
            None => Resolution::Missing(MissingConfiguration::Method {
                method: method.clone(),
                path: path.to_string(),
            }),
        }
    }

    /// Returns the entry for a `(path, method)` pair.
    #[must_use]
    pub fn get(&self, path: &str, method: &Method) -> Option<&RouteEntry> {
        self.routes.get(path).and_then(|methods| methods.get(method))
    }

    /// Returns the number of `(path, method)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(IndexMap::len).sum()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
