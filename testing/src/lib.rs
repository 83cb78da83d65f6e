//! # Estate API Testing
//!
//! Testing utilities for the Estate API client.
//!
//! This crate provides:
//! - [`MockExecutor`]: a scripted, recording [`RequestExecutor`](estate_api_core::RequestExecutor)
//! - [`respond`]: helpers for building handler results
//! - [`init_tracing`]: idempotent tracing setup for test output
//!
//! ## Example
//!
//! ```
//! use estate_api_core::{ApiRequest, Method, RequestExecutor};
//! use estate_api_testing::{respond, MockExecutor};
//! use serde_json::json;
//!
//! # async fn example() {
//! let mock = MockExecutor::new();
//! mock.on(Method::GET, "/items", |req| respond::json(req, json!([1, 2, 3])));
//!
//! let response = mock.execute(ApiRequest::get("/items")).await.unwrap();
//! assert_eq!(response.body, json!([1, 2, 3]));
//! assert_eq!(mock.calls_to("/items"), 1);
//! # }
//! ```

pub mod mock_executor;

pub use mock_executor::{respond, MockExecutor};

/// Install a `tracing` subscriber writing to the test harness.
///
/// Honors `RUST_LOG`. Safe to call from every test; only the first call
/// installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
