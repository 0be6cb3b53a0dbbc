//! In-memory client for driving a pipeline.

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde_json::json;
use tollgate_middleware::{BoxFuture, MiddlewareContext, Pipeline, Request, Response};

/// Sends test requests through a [`Pipeline`] without a network.
///
/// The default handler answers `200 {"items": ...}` with whatever the
/// validation stage attached to the context (`null` when nothing was).
///
/// # Example
///
/// ```
/// use tollgate_middleware::{Pipeline, ValidationMiddleware, ValidatorOptions};
/// use tollgate_schema::{Field, ObjectSchema};
/// use tollgate_test::{TestClient, TestRequest};
///
/// # tokio_test::block_on(async {
/// let schema = ObjectSchema::new().key("limit", Field::integer().min(1));
/// let client = TestClient::new(
///     Pipeline::builder()
///         .add_pre_handler_stage(ValidationMiddleware::route(schema, ValidatorOptions::default()))
///         .build(),
/// );
///
/// let response = client
///     .send(TestRequest::get("/users").query("limit", "0").build().unwrap())
///     .await
///     .unwrap();
///
/// response.assert_rejected("the value of limit must be larger than or equal to 1");
/// # });
/// ```
pub struct TestClient {
    pipeline: Pipeline,
}

impl TestClient {
    /// Creates a client over a pipeline.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Returns the pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Sends a request to the items-echo handler.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        self.send_with(request, echo_items).await
    }

    /// Sends a request to a custom terminal handler.
    pub async fn send_with<H>(
        &self,
        request: TestRequest,
        handler: H,
    ) -> Result<TestResponse, TestError>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let response = self
            .pipeline
            .process(MiddlewareContext::new(), request.into_http_request(), handler)
            .await;
        TestResponse::from_http(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("stages", &self.pipeline.stage_names())
            .finish()
    }
}

/// Terminal handler answering `200 {"items": ...}`.
pub fn echo_items(ctx: &mut MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
    let body = json!({ "items": ctx.take_items() });
    Box::pin(async move {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("valid response")
    })
}
