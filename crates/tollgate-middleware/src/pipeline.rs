//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] runs its stages in registration order, then the handler.
//! Stages that forward an error through [`Next::fail`] skip every remaining
//! stage and the handler; the pipeline's [`ErrorHandler`] builds the
//! response instead.
//!
//! ```text
//! Request → BodyParser → Validation → ... → Handler
//!                │             │
//!                └──── fail ───┴──→ ErrorHandler → Response
//! ```

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, ErrorHandler, Middleware, Next};
use crate::stages::error_handler::JsonErrorHandler;
use crate::types::{Request, Response};

/// An immutable, ordered middleware pipeline.
///
/// # Example
///
/// ```
/// use tollgate_middleware::{BodyParserMiddleware, Pipeline};
///
/// let pipeline = Pipeline::builder()
///     .add_pre_handler_stage(BodyParserMiddleware::new())
///     .build();
///
/// assert_eq!(pipeline.stage_names(), vec!["body_parser"]);
/// ```
pub struct Pipeline {
    /// Stages that run before the handler
    pre_handler_stages: Vec<Arc<dyn Middleware>>,

    /// Receives errors forwarded by stages
    error_handler: Arc<dyn ErrorHandler>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through the entire pipeline.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Builds the middleware chain for a request.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler_with_errors(handler, self.error_handler.as_ref());

        for middleware in self.pre_handler_stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pre_handler_stages
            .iter()
            .map(|mw| mw.name())
            .collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.pre_handler_stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    /// Pre-handler stages
    pre_handler_stages: Vec<Arc<dyn Middleware>>,

    /// Error handler, if overridden
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pre_handler_stages: Vec::new(),
            error_handler: None,
        }
    }

    /// Adds a stage that runs before the handler.
    ///
    /// Body parsing must be added before validation.
    #[must_use]
    pub fn add_pre_handler_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.pre_handler_stages.push(Arc::new(middleware));
        self
    }

    /// Sets the handler for forwarded errors.
    ///
    /// Defaults to [`JsonErrorHandler`].
    #[must_use]
    pub fn error_handler<E: ErrorHandler>(mut self, handler: E) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            pre_handler_stages: self.pre_handler_stages,
            error_handler: self
                .error_handler
                .unwrap_or_else(|| Arc::new(JsonErrorHandler::new())),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TollgateError;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tollgate_schema::ValidationFailure;

    /// A test middleware that records its invocation order.
    struct OrderTrackingMiddleware {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.counter.fetch_add(1, Ordering::SeqCst);
                self.order.lock().unwrap().push(self.name);

                if self.fail {
                    return next.fail(ctx, ValidationFailure::new("stopped").into());
                }
                next.run(ctx, request).await
            })
        }
    }

    struct Tracker {
        counter: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Tracker {
        fn new() -> Self {
            Self {
                counter: Arc::new(AtomicUsize::new(0)),
                order: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn stage(&self, name: &'static str, fail: bool) -> OrderTrackingMiddleware {
            OrderTrackingMiddleware {
                name,
                counter: self.counter.clone(),
                order: self.order.clone(),
                fail,
            }
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler(_ctx: &mut MiddlewareContext, _req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async {
            HttpResponse::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("OK")))
                .unwrap()
        })
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let tracker = Tracker::new();
        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(tracker.stage("first", false))
            .add_pre_handler_stage(tracker.stage("second", false))
            .add_pre_handler_stage(tracker.stage("third", false))
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), ok_handler)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(tracker.counter.load(Ordering::SeqCst), 3);
        assert_eq!(*tracker.order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_fail_skips_remaining_stages_and_handler() {
        let tracker = Tracker::new();
        let handler_calls = Arc::new(AtomicUsize::new(0));
        let calls = handler_calls.clone();

        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(tracker.stage("first", true))
            .add_pre_handler_stage(tracker.stage("second", false))
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), move |ctx, req| {
                calls.fetch_add(1, Ordering::SeqCst);
                ok_handler(ctx, req)
            })
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(*tracker.order.lock().unwrap(), vec!["first"]);
        assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_error_handler() {
        let tracker = Tracker::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(tracker.stage("first", true))
            .error_handler(move |_ctx: &mut MiddlewareContext, error: TollgateError| {
                sink.lock().unwrap().push(error.to_string());
                Response::json_message(StatusCode::UNPROCESSABLE_ENTITY, "custom")
            })
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), ok_handler)
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(*seen.lock().unwrap(), vec!["stopped".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let response = pipeline
            .process(MiddlewareContext::new(), request(), ok_handler)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_stage_names() {
        let tracker = Tracker::new();
        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(tracker.stage("a", false))
            .add_pre_handler_stage(tracker.stage("b", false))
            .build();
        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
        assert_eq!(pipeline.stage_count(), 2);
    }
}
