//! Mapping from raw transport failures to [`ApiError`].
//!
//! The normalizer is a pure function with no state. It decides, in order:
//!
//! 1. A response arrived and its body is a Problem-Details object → pass through
//! 2. A response arrived otherwise → generic server error (`UNKNOWN_ERROR`)
//! 3. The request was sent but nothing came back → `NETWORK_ERROR`, status 0
//! 4. The request never left → `REQUEST_ERROR`, status 0, empty instance

use crate::error::{codes, ApiError, ErrorKind};
use serde_json::Value;

/// Keys that must all be present for a body to count as Problem Details.
pub const PROBLEM_DETAIL_KEYS: [&str; 5] = ["type", "title", "status", "detail", "instance"];

/// A raw failure as observed by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The server answered with a non-success status.
    Response {
        /// HTTP status code
        status: u16,
        /// Response body, if it parsed as JSON
        body: Option<Value>,
        /// Request path
        instance: String,
    },
    /// The request was sent but no response arrived.
    NoResponse {
        /// Request path
        instance: String,
        /// Transport error message
        message: String,
    },
    /// The request could not be constructed or dispatched.
    NotDispatched {
        /// Construction error message
        message: String,
    },
}

/// Returns `true` if `body` is an object with every Problem-Details key.
///
/// The check is shallow: keys must exist, their values are not validated.
#[must_use]
pub fn is_problem_detail(body: &Value) -> bool {
    body.as_object()
        .is_some_and(|map| PROBLEM_DETAIL_KEYS.iter().all(|key| map.contains_key(*key)))
}

/// Convert a raw failure into the normalized error taxonomy.
#[must_use]
pub fn normalize(failure: Failure) -> ApiError {
    match failure {
        Failure::Response {
            status,
            body,
            instance,
        } => match body {
            Some(body) if is_problem_detail(&body) => ApiError::from_problem(body, status),
            body => ApiError::new(
                ErrorKind::ServerGeneric,
                codes::UNKNOWN_ERROR,
                "API Error",
                status,
                body.as_ref()
                    .and_then(generic_detail)
                    .unwrap_or("Unknown error"),
                instance,
            ),
        },
        Failure::NoResponse { instance, message } => ApiError::new(
            ErrorKind::NetworkUnreachable,
            codes::NETWORK_ERROR,
            "Network Error",
            0,
            non_empty(message, "No response from server"),
            instance,
        ),
        Failure::NotDispatched { message } => ApiError::new(
            ErrorKind::ClientRequest,
            codes::REQUEST_ERROR,
            "Request Error",
            0,
            non_empty(message, "Failed to create request"),
            "",
        ),
    }
}

fn generic_detail(body: &Value) -> Option<&str> {
    ["message", "detail"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
