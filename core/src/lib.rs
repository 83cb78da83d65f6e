//! # Estate API Core
//!
//! Transport-agnostic building blocks for the Estate API client.
//!
//! This crate provides:
//! - [`ApiRequest`] / [`ApiResponse`]: the request model that flows through
//!   the middleware chain
//! - [`RequestExecutor`] and [`Layer`]: the seam every middleware and
//!   transport implements
//! - [`ApiError`]: the normalized error every failure path ends in
//! - [`normalize`]: the pure mapping from raw failures to [`ApiError`]
//!
//! ## Architecture
//!
//! ```text
//! caller → Session facade → TokenRefresh (Layer) → Transport → network
//! ```
//!
//! Errors are normalized at the transport boundary. Middleware only ever sees
//! [`ApiError`] values, never raw transport errors.
//!
//! ## Example
//!
//! ```
//! use estate_api_core::{normalize, Failure, ErrorKind};
//! use serde_json::json;
//!
//! let error = normalize(Failure::Response {
//!     status: 400,
//!     body: Some(json!({ "message": "bad input" })),
//!     instance: "/items".to_string(),
//! });
//!
//! assert_eq!(error.kind(), ErrorKind::ServerGeneric);
//! assert_eq!(error.detail(), "bad input");
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod executor;
pub mod normalize;
pub mod request;

pub use error::{codes, ApiError, ErrorKind, Result};
pub use executor::{ExecutorFuture, Layer, RequestExecutor};
pub use normalize::{normalize, Failure};
pub use request::{ApiRequest, ApiResponse};

// Re-export the HTTP types that appear in the public request model
pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
