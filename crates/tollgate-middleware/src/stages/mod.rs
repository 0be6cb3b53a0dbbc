//! Middleware stages.
//!
//! Stages run in the order they are added to the pipeline. A typical
//! validation pipeline is:
//!
//! 1. [`body_parser`] - buffer and parse JSON / form bodies
//! 2. [`validation`] - merge sources, validate, attach `items`
//!
//! Errors a stage forwards are answered by the pipeline's error handler,
//! [`error_handler::JsonErrorHandler`] unless overridden.

pub mod body_parser;
pub mod error_handler;
pub mod validation;

// Re-export main types
pub use body_parser::BodyParserMiddleware;
pub use error_handler::JsonErrorHandler;
pub use validation::ValidationMiddleware;
