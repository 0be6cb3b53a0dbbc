//! Body parsing middleware.
//!
//! Buffers the request body and stores its fields as a [`ParsedBody`]
//! extension, so the validation stage can merge them. Must run before
//! validation.
//!
//! | Content type                          | Result                          |
//! |---------------------------------------|---------------------------------|
//! | `application/json` (object)           | fields of the object            |
//! | `application/json` (other / invalid)  | `400 {"message": ...}`          |
//! | `application/x-www-form-urlencoded`   | form fields, repeated keys as arrays |
//! | anything else, or an empty body       | no `ParsedBody`                 |

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::Value;
use tollgate_schema::Record;
use tracing::debug;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::sources::{insert_repeated, ParsedBody};
use crate::types::{Request, Response, ResponseExt};

/// Default maximum body size (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Parses JSON and form bodies into a [`ParsedBody`] extension.
#[derive(Debug, Clone)]
pub struct BodyParserMiddleware {
    max_body_size: usize,
}

/// Why a body was refused.
#[derive(Debug)]
enum BodyRejection {
    TooLarge(usize),
    Invalid(String),
}

impl Default for BodyParserMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyParserMiddleware {
    /// Creates a body parser with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the maximum accepted body size in bytes.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    fn parse(&self, content_type: &str, body: &[u8]) -> Result<Option<Record>, BodyRejection> {
        if body.len() > self.max_body_size {
            return Err(BodyRejection::TooLarge(self.max_body_size));
        }
        if body.is_empty() {
            return Ok(None);
        }

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/json" => parse_json(body).map(Some),
            "application/x-www-form-urlencoded" => parse_form(body).map(Some),
            _ => Ok(None),
        }
    }
}

fn parse_json(body: &[u8]) -> Result<Record, BodyRejection> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| BodyRejection::Invalid(format!("invalid JSON body: {e}")))?;

    match value {
        Value::Object(fields) => Ok(fields.into_iter().collect()),
        _ => Err(BodyRejection::Invalid(
            "request body must be a JSON object".to_string(),
        )),
    }
}

fn parse_form(body: &[u8]) -> Result<Record, BodyRejection> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| BodyRejection::Invalid(format!("invalid form body: {e}")))?;

    let mut record = Record::new();
    for (key, value) in pairs {
        insert_repeated(&mut record, key, Value::String(value));
    }
    Ok(record)
}

impl Middleware for BodyParserMiddleware {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            let bytes: Bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            match self.parse(content_type, &bytes) {
                Ok(Some(record)) => {
                    debug!(request_id = %ctx.request_id(), fields = record.len(), "body parsed");
                    parts.extensions.insert(ParsedBody(record));
                }
                Ok(None) => {}
                Err(BodyRejection::TooLarge(limit)) => {
                    return Response::json_message(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        &format!("request body exceeds {limit} bytes"),
                    );
                }
                Err(BodyRejection::Invalid(message)) => {
                    debug!(request_id = %ctx.request_id(), %message, "body rejected");
                    return Response::json_message(StatusCode::BAD_REQUEST, &message);
                }
            }

            let request = Request::from_parts(parts, Full::new(bytes));
            next.run(ctx, request).await
        })
    }
}
