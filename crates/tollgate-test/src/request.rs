//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use serde::Serialize;
use tollgate_middleware::{Request, RouteMatch};

/// A test request, ready to be turned into a pipeline [`Request`].
#[derive(Debug)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Matched route, as an upstream router would report it
    pub route: Option<RouteMatch>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, path)
    }

    /// Creates a new PUT request.
    pub fn put(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, path)
    }

    /// Creates a new PATCH request.
    pub fn patch(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, path)
    }

    /// Converts this request to a pipeline request.
    ///
    /// The route match, if any, is stored in the request extensions.
    pub fn into_http_request(self) -> Request {
        let mut request = Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;

        if let Some(route) = self.route {
            request.extensions_mut().insert(route);
        }

        request
    }
}

/// Builder for constructing test requests.
///
/// Invalid input (a bad header, an unserializable body) is reported by
/// [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tollgate_test::TestRequest;
///
/// let request = TestRequest::get("/users/42")
///     .route("/users/:id")
///     .param("id", "42")
///     .query("name", "tom smith")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.uri, "/users/42?name=tom%20smith");
/// assert_eq!(request.route.unwrap().params["id"], "42");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<String>,
    route: Option<RouteMatch>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().to_string(),
            query: Vec::new(),
            route: None,
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Sets the matched route pattern.
    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        let params = self.route.take().map(|r| r.params).unwrap_or_default();
        self.route = Some(RouteMatch {
            path: pattern.into(),
            params,
        });
        self
    }

    /// Adds a captured path parameter.
    ///
    /// Without [`route`](Self::route), the request path doubles as the
    /// route pattern.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let route = self
            .route
            .take()
            .unwrap_or_else(|| RouteMatch::new(self.path.clone()));
        self.route = Some(route.param(name, value));
        self
    }

    /// Appends a query parameter, percent-encoding both parts.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query.push(format!(
            "{}={}",
            urlencoding::encode(name.as_ref()),
            urlencoding::encode(value.as_ref())
        ));
        self
    }

    /// Appends a query string fragment verbatim.
    pub fn raw_query(mut self, query: impl Into<String>) -> Self {
        self.query.push(query.into());
        self
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", name.as_ref())));
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", value.as_ref())));

        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => {
                self.fail(e.into());
                self
            }
        }
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        match serde_urlencoded::to_string(pairs) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => {
                self.fail(e.into());
                self
            }
        }
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let target = if self.query.is_empty() {
            self.path
        } else {
            format!("{}?{}", self.path, self.query.join("&"))
        };

        let uri: Uri = target
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            route: self.route,
        })
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods() {
        assert_eq!(TestRequest::get("/a").build().unwrap().method, Method::GET);
        assert_eq!(TestRequest::post("/a").build().unwrap().method, Method::POST);
        assert_eq!(TestRequest::put("/a").build().unwrap().method, Method::PUT);
        assert_eq!(
            TestRequest::patch("/a").build().unwrap().method,
            Method::PATCH
        );
        assert_eq!(
            TestRequest::delete("/a").build().unwrap().method,
            Method::DELETE
        );
    }

    #[test]
    fn test_query_is_encoded() {
        let request = TestRequest::get("/users")
            .query("limit", "5")
            .query("q", "a&b")
            .build()
            .unwrap();

        assert_eq!(request.uri.path(), "/users");
        assert_eq!(request.uri.query(), Some("limit=5&q=a%26b"));
    }

    #[test]
    fn test_raw_query() {
        let request = TestRequest::get("/users")
            .raw_query("name=%E0%A4%A")
            .build()
            .unwrap();

        assert_eq!(request.uri.query(), Some("name=%E0%A4%A"));
    }

    #[test]
    fn test_param_without_route_uses_path() {
        let request = TestRequest::get("/users/7")
            .param("id", "7")
            .build()
            .unwrap();

        let route = request.route.unwrap();
        assert_eq!(route.path, "/users/7");
        assert_eq!(route.params["id"], "7");
    }

    #[test]
    fn test_route_keeps_earlier_params() {
        let request = TestRequest::get("/users/7")
            .param("id", "7")
            .route("/users/:id")
            .build()
            .unwrap();

        let route = request.route.unwrap();
        assert_eq!(route.path, "/users/:id");
        assert_eq!(route.params["id"], "7");
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(request.body.as_ref(), b"{\"name\":\"Alice\"}");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/users")
            .form(&[("name", "tom smith"), ("age", "5")])
            .build()
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.as_ref(), b"name=tom+smith&age=5");
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let result = TestRequest::get("/users")
            .header("bad header", "value")
            .build();

        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("not a uri").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_into_http_request() {
        let request = TestRequest::post("/users/1")
            .route("/users/:id")
            .param("id", "1")
            .header("X-Test", "value")
            .body("raw")
            .build()
            .unwrap()
            .into_http_request();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/users/1");
        assert_eq!(request.headers().get("X-Test").unwrap(), "value");
        assert_eq!(
            request.extensions().get::<RouteMatch>().unwrap().path,
            "/users/:id"
        );
    }
}
