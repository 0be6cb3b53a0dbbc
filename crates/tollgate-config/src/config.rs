//! Configuration types.
//!
//! This module provides the top-level [`TollgateConfig`] struct and its builder.

use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};
use tollgate_middleware::{RouteDefinition, ValidationMiddleware, ValidatorOptions};
use tollgate_schema::{ObjectSchema, SchemaRef};
use tollgate_telemetry::{create_env_filter, LogConfig};

use crate::ConfigError;

/// Complete Tollgate configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from a file.
///
/// # Example
///
/// ```
/// use tollgate_config::TollgateConfig;
///
/// let config = TollgateConfig::default();
/// assert!(config.validation.strict);
/// assert!(config.routes.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Validator options.
    #[serde(default)]
    pub validation: ValidatorOptions,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Route map. `None` when the file has no `routes` array at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteConfig>>,
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Route pattern, as matched by the router.
    pub path: String,

    /// HTTP method, case-insensitive.
    pub method: String,

    /// Whether requests to this route are validated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Inline schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ObjectSchema>,
}

const fn default_enabled() -> bool {
    true
}

impl RouteConfig {
    /// Creates an enabled route entry with a schema.
    pub fn new(method: impl Into<String>, path: impl Into<String>, schema: ObjectSchema) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            enabled: true,
            schema: Some(schema),
        }
    }

    /// Creates a disabled route entry.
    pub fn disabled(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            enabled: false,
            schema: None,
        }
    }

    /// Parses the method.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the method is not a valid HTTP
    /// method token.
    pub fn parse_method(&self) -> Result<Method, ConfigError> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            ConfigError::invalid_value(
                "routes.method",
                format!("invalid HTTP method: {:?}", self.method),
            )
        })
    }

    /// Converts the entry into a route definition.
    pub fn to_definition(&self) -> Result<RouteDefinition, ConfigError> {
        let method = self.parse_method()?;
        let schema = self
            .schema
            .clone()
            .map(|schema| Arc::new(schema) as SchemaRef);
        Ok(RouteDefinition::new(
            method,
            self.path.clone(),
            self.enabled,
            schema,
        ))
    }
}

impl TollgateConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::{RouteConfig, TollgateConfig};
    /// use tollgate_middleware::ValidatorOptions;
    ///
    /// let config = TollgateConfig::builder()
    ///     .validation(ValidatorOptions::lax())
    ///     .route(RouteConfig::disabled("GET", "/health"))
    ///     .build();
    ///
    /// assert!(!config.validation.strict);
    /// assert_eq!(config.routes.unwrap().len(), 1);
    /// ```
    #[must_use]
    pub fn builder() -> TollgateConfigBuilder {
        TollgateConfigBuilder::new()
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logging; validation defaults are unchanged.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Create a production configuration preset.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a valid filter directive
    /// - A route method is not a valid HTTP method
    /// - A route path does not start with `/`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        for (index, route) in self.routes.iter().flatten().enumerate() {
            route.parse_method().map_err(|_| {
                ConfigError::invalid_value(
                    format!("routes[{index}].method"),
                    format!("invalid HTTP method: {:?}", route.method),
                )
            })?;

            if !route.path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    format!("routes[{index}].path"),
                    format!("must start with '/': {:?}", route.path),
                ));
            }
        }

        Ok(())
    }

    /// Returns the validator options.
    #[must_use]
    pub fn validator_options(&self) -> ValidatorOptions {
        self.validation
    }

    /// Returns the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> &LogConfig {
        &self.logging
    }

    /// Converts the route map into route definitions.
    ///
    /// An absent route map stays `None`, which the route table treats as an
    /// undefined map.
    pub fn route_definitions(&self) -> Result<Option<Vec<RouteDefinition>>, ConfigError> {
        self.routes
            .as_ref()
            .map(|routes| routes.iter().map(RouteConfig::to_definition).collect())
            .transpose()
    }

    /// Builds a table-driven validation middleware from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Routes` if the route table cannot be built under
    /// strict options (duplicate route, enabled route without schema, or no
    /// route map).
    pub fn validation_middleware(&self) -> Result<ValidationMiddleware, ConfigError> {
        let definitions = self.route_definitions()?;
        Ok(ValidationMiddleware::from_routes(
            definitions,
            self.validation,
        )?)
    }
}

/// Builder for [`TollgateConfig`].
#[derive(Debug, Default)]
pub struct TollgateConfigBuilder {
    config: TollgateConfig,
}

impl TollgateConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validator options.
    #[must_use]
    pub fn validation(mut self, validation: ValidatorOptions) -> Self {
        self.config.validation = validation;
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Add a route, creating the route map if needed.
    #[must_use]
    pub fn route(mut self, route: RouteConfig) -> Self {
        self.config.routes.get_or_insert_with(Vec::new).push(route);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TollgateConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_middleware::{OnInvalid, TollgateError};
    use tollgate_schema::Field;

    fn users() -> ObjectSchema {
        ObjectSchema::new().key("limit", Field::integer().min(1).max(25))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TollgateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validator_options(), ValidatorOptions::default());
    }

    #[test]
    fn test_presets() {
        assert_eq!(TollgateConfig::development().logging.level, "debug");
        assert_eq!(
            TollgateConfig::production().log_config(),
            &LogConfig::production()
        );
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let config = TollgateConfig::builder()
            .route(RouteConfig::new("GET", "users", users()))
            .build();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "routes[0].path"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let config = TollgateConfig::builder()
            .route(RouteConfig::disabled("GET", "/health"))
            .route(RouteConfig::new("GE T", "/users", users()))
            .build();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "routes[1].method"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = TollgateConfig::default();
        config.logging.level = "tollgate=verbose".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let route = RouteConfig::new("post", "/users", users());
        assert_eq!(route.parse_method().unwrap(), Method::POST);
    }

    #[test]
    fn test_route_definitions() {
        assert!(TollgateConfig::default()
            .route_definitions()
            .unwrap()
            .is_none());

        let config = TollgateConfig::builder()
            .route(RouteConfig::new("GET", "/users", users()))
            .route(RouteConfig::disabled("GET", "/health"))
            .build();
        let definitions = config.route_definitions().unwrap().unwrap();

        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].method, Method::GET);
        assert!(definitions[0].enabled);
        assert!(definitions[0].schema.is_some());
        assert!(!definitions[1].enabled);
        assert!(definitions[1].schema.is_none());
    }

    #[test]
    fn test_validation_middleware() {
        let config = TollgateConfig::builder()
            .validation(ValidatorOptions::default().on_invalid(OnInvalid::Forward))
            .route(RouteConfig::new("GET", "/users", users()))
            .build();

        let middleware = config.validation_middleware().unwrap();
        assert_eq!(middleware.options().on_invalid, OnInvalid::Forward);
    }

    #[test]
    fn test_validation_middleware_without_routes() {
        let strict = TollgateConfig::default();
        assert!(matches!(
            strict.validation_middleware(),
            Err(ConfigError::Routes(TollgateError::ConfigurationMissing(_)))
        ));

        let lax = TollgateConfig::builder()
            .validation(ValidatorOptions::lax())
            .build();
        assert!(lax.validation_middleware().is_ok());
    }

    #[test]
    fn test_validation_middleware_duplicate_route() {
        let config = TollgateConfig::builder()
            .route(RouteConfig::new("GET", "/users", users()))
            .route(RouteConfig::new("get", "/users", users()))
            .build();

        assert!(matches!(
            config.validation_middleware(),
            Err(ConfigError::Routes(TollgateError::ConfigurationConflict { .. }))
        ));
    }
}
