//! Typed configuration for Tollgate.
//!
//! This crate loads validator options, logging settings, and the route map
//! from TOML or JSON:
//! - Strict parsing (fails on unknown fields)
//! - Inline schemas for each route
//! - Layered loading (defaults → file)
//!
//! # Example
//!
//! ```no_run
//! use tollgate_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tollgate_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("tollgate.toml")?
//!     .load()?;
//!
//! let validation = config.validation_middleware()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [validation]
//! strict = true
//! decode = true
//! on_invalid = "respond"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [[routes]]
//! path = "/users"
//! method = "GET"
//!
//! [routes.schema.keys.limit]
//! type = "integer"
//! min = 1
//! max = 25
//!
//! [[routes]]
//! path = "/health"
//! method = "GET"
//! enabled = false
//! ```
//!
//! A file without any `[[routes]]` has no route map: strict options refuse to
//! build a middleware from it, lax options build an empty table.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{RouteConfig, TollgateConfig, TollgateConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
