//! `reqwest`-backed [`RequestExecutor`].

use crate::config::TransportConfig;
use crate::error::ConfigError;
use estate_api_core::{
    normalize, ApiRequest, ApiResponse, ExecutorFuture, Failure, RequestExecutor, Result,
};
use reqwest::{Client, Url};
use serde_json::Value;

/// HTTP transport.
///
/// Cheap to clone; clones share the connection pool and the cookie store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingBaseUrl` / `ConfigError::InvalidBaseUrl` for a bad base URL
    /// - `ConfigError::Client` if the HTTP client cannot be built
    pub fn new(config: TransportConfig) -> std::result::Result<Self, ConfigError> {
        let base_url = config.validated_base_url()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .default_headers(config.headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        tracing::debug!(base_url = %base_url, timeout_ms = config.timeout.as_millis(), "HTTP transport created");

        Ok(Self { client, base_url })
    }

    /// The validated base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> std::result::Result<Url, String> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Url::parse(&joined).map_err(|e| format!("Invalid request URL {joined:?}: {e}"))
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let instance = request.path.clone();

        let url = self
            .url_for(&request.path)
            .map_err(|message| normalize(Failure::NotDispatched { message }))?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, path = %instance, "Dispatching request");

        let response = builder.send().await.map_err(|e| {
            let message = e.to_string();
            if e.is_builder() {
                normalize(Failure::NotDispatched { message })
            } else {
                tracing::warn!(method = %request.method, path = %instance, error = %message, "No response from server");
                normalize(Failure::NoResponse {
                    instance: instance.clone(),
                    message,
                })
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await;

        if status.is_success() {
            let bytes = bytes.map_err(|e| {
                normalize(Failure::NoResponse {
                    instance: instance.clone(),
                    message: e.to_string(),
                })
            })?;

            tracing::debug!(method = %request.method, path = %instance, status = status.as_u16(), "Request succeeded");

            return Ok(ApiResponse {
                status,
                headers,
                body: decode_body(&bytes),
                instance,
            });
        }

        let body = bytes
            .ok()
            .filter(|b| !b.is_empty())
            .and_then(|b| serde_json::from_slice::<Value>(&b).ok());

        tracing::debug!(method = %request.method, path = %instance, status = status.as_u16(), "Server returned error status");

        Err(normalize(Failure::Response {
            status: status.as_u16(),
            body,
            instance,
        }))
    }
}

impl RequestExecutor for HttpTransport {
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_> {
        Box::pin(self.send(request))
    }
}

/// Empty → `null`, JSON → parsed value, anything else → JSON string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
