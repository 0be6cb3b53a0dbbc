//! Request validation middleware.
//!
//! Merges the request's path parameters, query and body, validates the merged
//! record against a schema, and either rejects the request or continues with
//! the record attached to the context as `items`.
//!
//! # Binding
//!
//! A [`ValidationMiddleware`] is bound to its schema in one of two ways:
//!
//! - **Per route**: one schema, attached to one route
//!   ([`ValidationMiddleware::route`]).
//! - **Route table**: one middleware for every route; the schema is looked up
//!   by the matched route pattern and request method
//!   ([`ValidationMiddleware::from_routes`]).
//!
//! # Outcomes
//!
//! | Situation                  | strict                       | lax                          |
//! |----------------------------|------------------------------|------------------------------|
//! | no schema configured       | forward `ConfigurationMissing` | warn, attach `items`, continue |
//! | route disabled             | attach `items`, continue     | attach `items`, continue     |
//! | schema rejects the record  | 400 (respond) or forward     | 400 (respond) or forward     |
//! | schema accepts the record  | restore extras, continue     | continue                     |
//!
//! # Example
//!
//! ```
//! use tollgate_middleware::{ValidationMiddleware, ValidatorOptions};
//! use tollgate_schema::{Field, ObjectSchema};
//!
//! let schema = ObjectSchema::new()
//!     .key("limit", Field::integer().min(1).max(25))
//!     .key("offset", Field::integer().min(0).max(25));
//!
//! let validation = ValidationMiddleware::route(schema, ValidatorOptions::default());
//! ```

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tollgate_schema::{Schema, SchemaRef, ValidateOptions};
use tollgate_telemetry::metrics::{record_validation, ValidationOutcome};
use tracing::{debug, warn};

use crate::context::MiddlewareContext;
use crate::error::{MissingConfiguration, TollgateResult};
use crate::merge::{merge, MergeOptions, Merged};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::options::{OnInvalid, ValidatorOptions};
use crate::route_table::{Resolution, RouteDefinition, RouteTable};
use crate::sources::{route_path, RequestSources};
use crate::types::{Request, Response, ResponseExt};

/// Where the middleware finds its schema.
#[derive(Clone)]
enum Binding {
    /// A single route's schema, if any.
    Route(Option<SchemaRef>),
    /// A shared route table.
    Table(Arc<RouteTable>),
}

/// Validates merged request data against a schema.
#[derive(Clone)]
pub struct ValidationMiddleware {
    binding: Binding,
    options: ValidatorOptions,
}

impl fmt::Debug for ValidationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = match &self.binding {
            Binding::Route(Some(_)) => "route",
            Binding::Route(None) => "route (no schema)",
            Binding::Table(_) => "table",
        };
        f.debug_struct("ValidationMiddleware")
            .field("binding", &binding)
            .field("options", &self.options)
            .finish()
    }
}

impl ValidationMiddleware {
    /// Creates a per-route middleware bound to `schema`.
    pub fn route<S: Schema + 'static>(schema: S, options: ValidatorOptions) -> Self {
        Self::route_shared(Arc::new(schema), options)
    }

    /// Creates a per-route middleware bound to a shared schema.
    pub fn route_shared(schema: SchemaRef, options: ValidatorOptions) -> Self {
        Self {
            binding: Binding::Route(Some(schema)),
            options,
        }
    }

    /// Creates a per-route middleware with no schema.
    ///
    /// Strict options make every request a configuration error; lax options
    /// merge and continue without validation.
    pub fn without_schema(options: ValidatorOptions) -> Self {
        Self {
            binding: Binding::Route(None),
            options,
        }
    }

    /// Creates a table-driven middleware over a prebuilt table.
    pub fn table(table: Arc<RouteTable>, options: ValidatorOptions) -> Self {
        Self {
            binding: Binding::Table(table),
            options,
        }
    }

    /// Builds a route table and a middleware over it.
    ///
    /// `options.strict` governs table construction too: see
    /// [`RouteTable::build`].
    pub fn from_routes(
        definitions: Option<Vec<RouteDefinition>>,
        options: ValidatorOptions,
    ) -> TollgateResult<Self> {
        let table = RouteTable::build(definitions, options.strict)?;
        Ok(Self::table(Arc::new(table), options))
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            strict: self.options.strict,
            decode: self.options.decode,
        }
    }

    fn resolve<'s>(&'s self, request: &Request) -> Resolution<'s> {
        match &self.binding {
            Binding::Route(Some(schema)) => Resolution::Validate(schema),
            Binding::Route(None) => Resolution::Missing(MissingConfiguration::Schema {
                method: request.method().clone(),
                path: route_path(request).to_string(),
            }),
            Binding::Table(table) => table.resolve(route_path(request), request.method()),
        }
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let sources = RequestSources::from_request(&request);
            let method = request.method().clone();

            let schema = match self.resolve(&request) {
                Resolution::Validate(schema) => schema,
                Resolution::Disabled => {
                    debug!(request_id = %ctx.request_id(), %method, "validation disabled for route");
                    record_validation(ValidationOutcome::Skipped);
                    let Merged { items, .. } = merge(&sources, &method, None, self.merge_options());
                    ctx.set_items(items);
                    return next.run(ctx, request).await;
                }
                Resolution::Missing(missing) => {
                    if self.options.strict {
                        record_validation(ValidationOutcome::Misconfigured);
                        return next.fail(ctx, missing.into());
                    }
                    warn!(request_id = %ctx.request_id(), "{missing}; continuing without validation");
                    record_validation(ValidationOutcome::Skipped);
                    let Merged { items, .. } = merge(&sources, &method, None, self.merge_options());
                    ctx.set_items(items);
                    return next.run(ctx, request).await;
                }
            };

            let Merged { items, extras } =
                merge(&sources, &method, Some(schema.as_ref()), self.merge_options());
            if !extras.is_empty() {
                debug!(
                    request_id = %ctx.request_id(),
                    held = extras.len(),
                    "undeclared keys held aside"
                );
            }

            let validate_options = ValidateOptions {
                allow_unknown: !self.options.strict,
                convert: true,
            };

            match schema.validate(items, &validate_options).await {
                Ok(mut validated) => {
                    extras.restore_into(&mut validated);
                    record_validation(ValidationOutcome::Passed);
                    ctx.set_items(validated);
                    next.run(ctx, request).await
                }
                Err(failure) => {
                    record_validation(ValidationOutcome::Rejected);
                    debug!(
                        request_id = %ctx.request_id(),
                        key = ?failure.key,
                        message = %failure.message,
                        "validation failed"
                    );
                    match self.options.on_invalid {
                        OnInvalid::Respond => {
                            Response::json_message(StatusCode::BAD_REQUEST, &failure.message)
                        }
                        OnInvalid::Forward => next.fail(ctx, failure.into()),
                    }
                }
            }
        })
    }
}
