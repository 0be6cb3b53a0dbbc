//! # Tollgate Middleware
//!
//! Request-validation middleware for an in-process HTTP pipeline.
//!
//! Each request's path parameters, query string, and body are merged into one
//! flat record, validated against a [`Schema`](tollgate_schema::Schema), and
//! either rejected or passed on with the record attached to the context as
//! `items`.
//!
//! ## Flow
//!
//! ```text
//! Request → BodyParser → Validation ──ok──→ Handler (ctx.items())
//!                            │
//!                            ├─ invalid, respond → 400 {"message": ...}
//!                            └─ invalid, forward → ErrorHandler
//! ```
//!
//! ## Key Features
//!
//! - **Strict admission**: undeclared keys never reach the schema and are
//!   restored into `items` after validation passes
//! - **Two bindings**: one schema per route, or one route table for all routes
//! - **Two failure styles**: answer `400` directly or forward to the error handler
//! - **Async schemas**: validation is awaited before the pipeline continues
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use tollgate_middleware::{
//!     BodyParserMiddleware, Pipeline, RouteDefinition, ValidationMiddleware, ValidatorOptions,
//! };
//! use tollgate_schema::{Field, ObjectSchema};
//!
//! let users = ObjectSchema::new()
//!     .key("limit", Field::integer().min(1).max(25))
//!     .key("name", Field::string().alphanum().min(2).max(25));
//!
//! let validation = ValidationMiddleware::from_routes(
//!     Some(vec![RouteDefinition::validated(Method::GET, "/users", users)]),
//!     ValidatorOptions::default(),
//! )
//! .unwrap();
//!
//! let pipeline = Pipeline::builder()
//!     .add_pre_handler_stage(BodyParserMiddleware::new())
//!     .add_pre_handler_stage(validation)
//!     .build();
//!
//! assert_eq!(pipeline.stage_names(), vec!["body_parser", "validation"]);
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod merge;
pub mod middleware;
pub mod options;
pub mod pipeline;
pub mod route_table;
pub mod sources;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::{MiddlewareContext, RequestId};
pub use error::{MissingConfiguration, TollgateError, TollgateResult};
pub use merge::{merge, Extras, MergeOptions, Merged};
pub use middleware::{BoxFuture, ErrorHandler, Middleware, Next};
pub use options::{OnInvalid, ValidatorOptions};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use route_table::{Resolution, RouteDefinition, RouteEntry, RouteTable};
pub use sources::{ParsedBody, RequestSources, RouteMatch};
pub use stages::{BodyParserMiddleware, JsonErrorHandler, ValidationMiddleware};
pub use types::{Request, Response, ResponseExt};
