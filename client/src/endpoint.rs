//! Typed endpoint descriptors.

use estate_api_auth::TokenRefresh;
use estate_api_core::{ApiRequest, Method, RequestExecutor, Result};
use estate_api_transport::HttpTransport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// A bound `method + path` pair with typed request and response payloads.
///
/// Created by [`ApiClient::get`](crate::ApiClient::get) and friends. An
/// endpoint holds a handle to the client's executor, so it can be stored and
/// called many times, from many tasks.
///
/// `GET` payloads are sent as query parameters. Every other verb sends the
/// payload as a JSON body; a `()` payload sends no body at all.
pub struct Endpoint<Req, Res, E = HttpTransport> {
    executor: TokenRefresh<E>,
    method: Method,
    path: String,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res, E> Endpoint<Req, Res, E> {
    pub(crate) fn new(executor: TokenRefresh<E>, method: Method, path: String) -> Self {
        Self {
            executor,
            method,
            path,
            _types: PhantomData,
        }
    }

    /// HTTP method of this endpoint.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path of this endpoint, relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<Req, Res, E> Endpoint<Req, Res, E>
where
    Req: Serialize,
    Res: DeserializeOwned,
    E: RequestExecutor + 'static,
{
    /// Call the endpoint.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`](estate_api_core::ApiError) for any
    /// failure: server errors, network errors, authentication failures, and a
    /// `DECODE_ERROR` when the response body does not match `Res`.
    pub async fn call(&self, payload: Req) -> Result<Res> {
        let request = self.request_for(&payload)?;
        self.executor.execute(request).await?.json()
    }

    /// Build the wire request for `payload` without sending it.
    ///
    /// # Errors
    ///
    /// Returns a `REQUEST_ERROR` if the payload cannot be serialized.
    pub fn request_for(&self, payload: &Req) -> Result<ApiRequest> {
        let mut request = ApiRequest::new(self.method.clone(), self.path.clone()).with_json(payload)?;

        match request.body.take() {
            None | Some(Value::Null) => {}
            Some(params) if self.method == Method::GET => {
                request = request.with_query_payload(&params);
            }
            Some(body) => request.body = Some(body),
        }

        Ok(request)
    }
}

impl<Req, Res, E> Clone for Endpoint<Req, Res, E> {
    fn clone(&self) -> Self {
        Self::new(self.executor.clone(), self.method.clone(), self.path.clone())
    }
}

impl<Req, Res, E> fmt::Debug for Endpoint<Req, Res, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
