//! # Tollgate
//!
//! **Request-validation middleware for in-process HTTP pipelines**
//!
//! Tollgate merges each request's path parameters, query string, and body
//! into one record, checks it against a schema, and either rejects the
//! request or hands the validated record to the handler:
//!
//! - **Schemas as data** – Joi-style object schemas, built in code or loaded from TOML/JSON
//! - **Strict by default** – undeclared keys bypass the schema, unconfigured routes are errors
//! - **Route tables** – one middleware validates every route from a `(path, method)` table
//! - **Two failure styles** – answer `400 {"message"}` directly or forward to an error handler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tollgate::prelude::*;
//!
//! let config = ConfigLoader::new().with_file("tollgate.toml")?.load()?;
//! init_logging(config.log_config())?;
//!
//! let pipeline = Pipeline::builder()
//!     .add_pre_handler_stage(BodyParserMiddleware::new())
//!     .add_pre_handler_stage(config.validation_middleware()?)
//!     .build();
//!
//! let response = pipeline.process(MiddlewareContext::new(), request, handler).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → BodyParser → Validation ──→ Handler (ctx.items())
//!                            │
//!                            └──→ 400 {"message"} | ErrorHandler
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export schema types
pub use tollgate_schema as schema;

// Re-export middleware types
pub use tollgate_middleware as middleware;

// Re-export configuration types
pub use tollgate_config as config;

// Re-export telemetry types
pub use tollgate_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use tollgate::prelude::*;
///
/// let schema = ObjectSchema::new().key("limit", Field::integer().min(1).max(25));
/// let validation = ValidationMiddleware::route(schema, ValidatorOptions::default());
/// assert!(validation.options().strict);
/// ```
pub mod prelude {
    pub use tollgate_schema::{
        Field, FieldKind, ObjectSchema, Pattern, Record, Schema, SchemaRef, ValidateOptions,
        ValidationFailure,
    };

    pub use tollgate_middleware::{
        BodyParserMiddleware, ErrorHandler, JsonErrorHandler, Middleware, MiddlewareContext,
        MissingConfiguration, Next, OnInvalid, ParsedBody, Pipeline, Request, Response,
        RouteDefinition, RouteMatch, RouteTable, TollgateError, TollgateResult,
        ValidationMiddleware, ValidatorOptions,
    };

    pub use tollgate_config::{ConfigError, ConfigLoader, RouteConfig, TollgateConfig};

    pub use tollgate_telemetry::{init_logging, LogConfig, LogFormat};
}
