//! # Tollgate Test
//!
//! Test utilities for Tollgate pipelines, running requests in memory
//! without a server or a router.
//!
//! ## Key Features
//!
//! - **Request Builder**: path parameters, query strings, JSON and form bodies
//! - **Route Matches**: requests carry the `RouteMatch` a router would set
//! - **Items Echo**: the default handler returns the validated `items`
//! - **Response Assertions**: status, `{"message"}` bodies, JSON fields
//!
//! ## Example
//!
//! ```ignore
//! use tollgate_test::{TestClient, TestRequest};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_list_users() {
//!     let client = TestClient::new(pipeline());
//!
//!     let response = client
//!         .send(TestRequest::get("/users").route("/users").query("limit", "5").build()?)
//!         .await?;
//!
//!     response
//!         .assert_status(StatusCode::OK)
//!         .assert_json_field("items.limit", &json!(5));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{echo_items, TestClient};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
