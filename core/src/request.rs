//! Request and response model shared by every executor in the chain.

use crate::error::{ApiError, Result};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// One HTTP call description.
///
/// Requests are cheap to clone so middleware can capture and replay them.
/// The `path` is relative to the transport's base URL and doubles as the
/// `instance` of any error the call produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL (e.g. `/auth/login`)
    pub path: String,
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Extra headers for this request
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// Create a request with no query, body or extra headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Flatten a serialized payload into query parameters.
    ///
    /// Only top-level object fields are used. Strings are taken as-is,
    /// `null` fields are skipped, everything else uses its JSON text.
    /// A non-object payload (e.g. `()`) adds nothing.
    #[must_use]
    pub fn with_query_payload(mut self, payload: &Value) -> Self {
        if let Some(map) = payload.as_object() {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.query.push((key.clone(), s.clone())),
                    other => self.query.push((key.clone(), other.to_string())),
                }
            }
        }
        self
    }

    /// Serialize `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns a `REQUEST_ERROR` if the payload cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(self, payload: &B) -> Result<Self> {
        let body = serde_json::to_value(payload).map_err(|e| {
            crate::normalize(crate::Failure::NotDispatched {
                message: e.to_string(),
            })
        })?;
        Ok(self.with_body(body))
    }
}

/// A successful (`2xx`) response with its decoded JSON body.
///
/// An empty body is represented as `null`; a non-JSON body as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: Value,
    /// Path of the request that produced this response
    pub instance: String,
}

impl ApiResponse {
    /// Create a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: Value, instance: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
            instance: instance.into(),
        }
    }

    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns a `DECODE_ERROR` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(|e| {
            ApiError::decode(self.status.as_u16(), e.to_string(), self.instance)
        })
    }
}
