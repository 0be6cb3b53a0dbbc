//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that all stages implement,
//! the [`Next`] continuation, and the [`ErrorHandler`] that receives errors a
//! stage forwards instead of answering itself.
//!
//! # Example
//!
//! ```
//! use tollgate_middleware::{BoxFuture, Middleware, Next, Request, Response};
//! use tollgate_middleware::context::MiddlewareContext;
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             tracing::debug!(request_id = %ctx.request_id(), "request");
//!             next.run(ctx, request).await
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::error::TollgateError;
use crate::stages::error_handler::JsonErrorHandler;
use crate::types::{Request, Response};

pub use tollgate_schema::BoxFuture;

/// Error handler used by [`Next::handler`] when no pipeline supplies one.
static DEFAULT_ERROR_HANDLER: JsonErrorHandler = JsonErrorHandler::new();

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware MUST consume `next` exactly once, through [`Next::run`] or
///   [`Next::fail`], unless it answers the request itself
/// - Middleware MUST NOT answer and forward the same request
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this middleware stage.
    ///
    /// This name is used for logging, metrics, and debugging.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Receives errors forwarded by middleware and turns them into responses.
///
/// Closures with the matching signature implement this trait.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Builds the response for a forwarded error.
    fn handle(&self, ctx: &mut MiddlewareContext, error: TollgateError) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut MiddlewareContext, TollgateError) -> Response + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut MiddlewareContext, error: TollgateError) -> Response {
        self(ctx, error)
    }
}

/// Callback to invoke the next middleware in the chain.
///
/// Consumed by value, so a stage can continue or fail at most once.
pub struct Next<'a> {
    /// The remaining middleware chain
    inner: NextInner<'a>,
    /// Where forwarded errors go
    errors: &'a dyn ErrorHandler,
}

/// Internal representation of the next middleware chain.
enum NextInner<'a> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain - invoke the handler
    Handler(
        Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>,
    ),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then continues with `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        let errors = next.errors;
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
            errors,
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    ///
    /// Forwarded errors go to the default [`JsonErrorHandler`].
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self::handler_with_errors(f, &DEFAULT_ERROR_HANDLER)
    }

    /// Creates a terminal `Next` with an explicit error handler.
    pub fn handler_with_errors<F>(f: F, errors: &'a dyn ErrorHandler) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
            errors,
        }
    }

    /// Invokes the next middleware or handler in the chain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }

    /// Skips the rest of the chain and hands `error` to the error handler.
    pub fn fail(self, ctx: &mut MiddlewareContext, error: TollgateError) -> Response {
        self.errors.handle(ctx, error)
    }
}
