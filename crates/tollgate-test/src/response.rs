//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// A buffered response with helper methods for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers an HTTP response.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the `message` of a `{"message": ...}` body.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.json::<Value>()
            .ok()?
            .get("message")?
            .as_str()
            .map(str::to_string)
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {} with body {:?}",
            expected,
            self.status,
            self.text().unwrap_or_default()
        );
        self
    }

    /// Asserts a `400 {"message": expected}` response.
    ///
    /// # Panics
    ///
    /// Panics if the status is not 400 or the message differs.
    pub fn assert_rejected(&self, expected: impl AsRef<str>) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST)
            .assert_message(expected)
    }

    /// Asserts that the body is `{"message": expected}`.
    ///
    /// # Panics
    ///
    /// Panics if the body has no message or the message differs.
    pub fn assert_message(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .message()
            .unwrap_or_else(|| panic!("No message in body: {:?}", self.text()));
        assert_eq!(actual, expected, "Message mismatch");
        self
    }

    /// Asserts that the Content-Type header starts with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self.content_type().expect("Content-Type header not found");
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{}', got '{}'",
            expected,
            actual
        );
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        let actual: Value = self.json().expect("Body should be valid JSON");
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// `path` is dot-separated; numeric segments index arrays.
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &Value) -> &Self {
        let path = path.as_ref();
        let json: Value = self.json().expect("Body should be valid JSON");
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{}' not found in: {:?}", path, json));
        assert_eq!(
            actual, expected,
            "JSON field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(segment),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    async fn response(status: u16, body: &str) -> TestResponse {
        let response = http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        TestResponse::from_http(response).await.unwrap()
    }

    #[tokio::test]
    async fn test_status_and_body() {
        let response = response(200, "{\"items\":{\"name\":\"tom\"}}").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.text().unwrap(), "{\"items\":{\"name\":\"tom\"}}");

        let value: Value = response.json().unwrap();
        assert_eq!(value["items"]["name"], "tom");
    }

    #[tokio::test]
    async fn test_message() {
        let response = response(400, "{\"message\":\"the key foo is not allowed\"}").await;
        assert_eq!(
            response.message().as_deref(),
            Some("the key foo is not allowed")
        );
        response.assert_rejected("the key foo is not allowed");
    }

    #[tokio::test]
    async fn test_message_absent() {
        assert!(response(200, "{}").await.message().is_none());
        assert!(response(200, "not json").await.message().is_none());
    }

    #[tokio::test]
    #[should_panic(expected = "Expected status 200 OK")]
    async fn test_assert_status_mismatch() {
        response(400, "{}").await.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_assert_json() {
        let response = response(200, "{\"items\":{\"tags\":[\"a\",\"b\"]}}").await;
        response
            .assert_content_type("application/json")
            .assert_json_field("items.tags.1", &json!("b"))
            .assert_json_eq(&json!({"items": {"tags": ["a", "b"]}}));
    }

    #[test]
    fn test_json_path() {
        let value = json!({
            "items": {
                "name": "tom",
                "tags": ["admin", "user"]
            }
        });

        assert_eq!(json_path(&value, "items.name"), Some(&json!("tom")));
        assert_eq!(json_path(&value, "items.tags.0"), Some(&json!("admin")));
        assert_eq!(json_path(&value, "nonexistent"), None);
    }
}
