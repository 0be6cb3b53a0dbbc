//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates a `{"message": ...}` JSON response.
    fn json_message(status: StatusCode, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn json_message(status: StatusCode, message: &str) -> Response {
        let body = serde_json::json!({ "message": message });
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON response")
    }
}
