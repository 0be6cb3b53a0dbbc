//! Default handler for forwarded errors.
//!
//! Stages forward errors with [`Next::fail`](crate::Next::fail). The pipeline
//! hands them to its [`ErrorHandler`]; unless overridden, that is the
//! [`JsonErrorHandler`] defined here.
//!
//! | Error                   | Status | Body                                   |
//! |-------------------------|--------|----------------------------------------|
//! | `ValidationFailure`     | 400    | `{"message": "<validator message>"}`   |
//! | configuration errors    | 500    | `{"message": "An internal error occurred"}` |
//!
//! Configuration errors are operator-facing: the detail is logged and only
//! revealed to clients with [`JsonErrorHandler::expose_internal_errors`].
//!
//! # Example
//!
//! ```
//! use tollgate_middleware::{JsonErrorHandler, Pipeline};
//!
//! // With verbose configuration errors (development only)
//! let pipeline = Pipeline::builder()
//!     .error_handler(JsonErrorHandler::new().expose_internal_errors(true))
//!     .build();
//! ```

use std::borrow::Cow;

use tracing::{debug, error};

use crate::context::MiddlewareContext;
use crate::error::TollgateError;
use crate::middleware::ErrorHandler;
use crate::types::{Response, ResponseExt};

/// Writes forwarded errors as `{"message": ...}` JSON.
#[derive(Debug, Clone)]
pub struct JsonErrorHandler {
    /// Whether to expose configuration error details.
    expose_internal_errors: bool,
    /// Message sent in place of hidden details.
    internal_error_message: Cow<'static, str>,
}

impl Default for JsonErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonErrorHandler {
    /// Creates a handler with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expose_internal_errors: false,
            internal_error_message: Cow::Borrowed("An internal error occurred"),
        }
    }

    /// Sets whether to expose configuration error details.
    ///
    /// **Warning**: Only enable this in development environments.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Sets the message sent for hidden configuration errors.
    #[must_use]
    pub fn internal_error_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.internal_error_message = message.into();
        self
    }
}

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, ctx: &mut MiddlewareContext, error: TollgateError) -> Response {
        let status = error.status_code();

        if error.is_configuration() {
            error!(
                request_id = %ctx.request_id(),
                code = error.code(),
                error = %error,
                "validation misconfigured"
            );
            if !self.expose_internal_errors {
                return Response::json_message(status, &self.internal_error_message);
            }
        } else {
            debug!(request_id = %ctx.request_id(), error = %error, "request rejected");
        }

        Response::json_message(status, &error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingConfiguration;
    use http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use tollgate_schema::ValidationFailure;

    async fn message(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["message"].as_str().unwrap().to_string()
    }

    fn missing() -> TollgateError {
        MissingConfiguration::Method {
            method: Method::POST,
            path: "/users".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let handler = JsonErrorHandler::new();
        let mut ctx = MiddlewareContext::new();

        let response = handler.handle(
            &mut ctx,
            ValidationFailure::new("the value of limit must be larger than or equal to 1").into(),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            message(response).await,
            "the value of limit must be larger than or equal to 1"
        );
    }

    #[tokio::test]
    async fn test_configuration_error_is_hidden() {
        let handler = JsonErrorHandler::new();
        let mut ctx = MiddlewareContext::new();

        let response = handler.handle(&mut ctx, missing());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message(response).await, "An internal error occurred");
    }

    #[tokio::test]
    async fn test_configuration_error_exposed() {
        let handler = JsonErrorHandler::new().expose_internal_errors(true);
        let mut ctx = MiddlewareContext::new();

        let response = handler.handle(&mut ctx, missing());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            message(response).await,
            "Validation not given for this path method: POST: /users"
        );
    }

    #[tokio::test]
    async fn test_custom_internal_message() {
        let handler = JsonErrorHandler::new().internal_error_message("try again later");
        let mut ctx = MiddlewareContext::new();

        let response = handler.handle(&mut ctx, missing());
        assert_eq!(message(response).await, "try again later");
    }
}
