//! Scripted executor for middleware tests.
//!
//! [`MockExecutor`] answers requests from per-route handlers and records every
//! request it receives, so tests can assert on headers, call counts and order.

#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use estate_api_core::{
    normalize, ApiRequest, ApiResponse, ExecutorFuture, Failure, Method, RequestExecutor, Result,
    StatusCode,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Handler = Arc<dyn Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync>;

#[derive(Clone)]
struct Route {
    method: Method,
    path: String,
    delay: Option<Duration>,
    handler: Handler,
}

/// Recording executor with scripted per-route responses.
///
/// Unmatched requests get a generic `404`. Routes registered later take
/// precedence, so a test can override a default handler.
#[derive(Clone, Default)]
pub struct MockExecutor {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockExecutor {
    /// Create an executor with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `handler`.
    pub fn on<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.push_route(method, path, None, Arc::new(handler))
    }

    /// Answer `method path` with `handler` after sleeping for `delay`.
    ///
    /// The delay keeps a request in flight long enough for concurrent
    /// callers to pile up behind it.
    pub fn on_delayed<F>(&self, method: Method, path: &str, delay: Duration, handler: F) -> &Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.push_route(method, path, Some(delay), Arc::new(handler))
    }

    fn push_route(
        &self,
        method: Method,
        path: &str,
        delay: Option<Duration>,
        handler: Handler,
    ) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Route {
                method,
                path: path.to_string(),
                delay,
                handler,
            });
        self
    }

    /// Every request received, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for `path`.
    #[must_use]
    pub fn calls_to(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    /// `Authorization` header values sent to `path`, in arrival order.
    ///
    /// `None` entries are requests that carried no `Authorization` header.
    #[must_use]
    pub fn authorization_headers(&self, path: &str) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .filter(|r| r.path == path)
            .map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }

    fn route_for(&self, request: &ApiRequest) -> Option<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.path == request.path)
            .cloned()
    }
}

impl RequestExecutor for MockExecutor {
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let route = self.route_for(&request);

        Box::pin(async move {
            match route {
                Some(route) => {
                    if let Some(delay) = route.delay {
                        tokio::time::sleep(delay).await;
                    }
                    (route.handler)(&request)
                }
                None => respond::status(&request, StatusCode::NOT_FOUND, None),
            }
        })
    }
}

/// Helpers for building handler results.
pub mod respond {
    use super::{normalize, ApiRequest, ApiResponse, Failure, Result, StatusCode};
    use serde_json::Value;

    /// `200 OK` with a JSON body.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match the handler signature.
    pub fn json(request: &ApiRequest, body: Value) -> Result<ApiResponse> {
        Ok(ApiResponse::new(StatusCode::OK, body, request.path.clone()))
    }

    /// Non-success status, normalized exactly as the HTTP transport would.
    ///
    /// # Errors
    ///
    /// Always returns the normalized error.
    pub fn status(request: &ApiRequest, status: StatusCode, body: Option<Value>) -> Result<ApiResponse> {
        Err(normalize(Failure::Response {
            status: status.as_u16(),
            body,
            instance: request.path.clone(),
        }))
    }

    /// `401 Unauthorized` with a plain message body.
    ///
    /// # Errors
    ///
    /// Always returns the normalized error.
    pub fn unauthorized(request: &ApiRequest) -> Result<ApiResponse> {
        status(
            request,
            StatusCode::UNAUTHORIZED,
            Some(serde_json::json!({ "message": "Token is invalid or expired" })),
        )
    }

    /// A request that never got a response.
    ///
    /// # Errors
    ///
    /// Always returns the normalized error.
    pub fn network_error(request: &ApiRequest) -> Result<ApiResponse> {
        Err(normalize(Failure::NoResponse {
            instance: request.path.clone(),
            message: "connection reset".to_string(),
        }))
    }

    /// Returns the bearer token the request carried, if any.
    #[must_use]
    pub fn bearer(request: &ApiRequest) -> Option<&str> {
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}
