//! Session-aware API client.

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use estate_api_auth::{RefreshConfig, RefreshPhase, SessionHooks, TokenRefresh, TokenRefreshLayer};
use estate_api_core::{ApiRequest, ApiResponse, Layer, Method, RequestExecutor, Result};
use estate_api_transport::{ConfigError, HttpTransport};

/// Estate API client.
///
/// Owns the access token and the refresh state for one session. Clones share
/// both, so a client can be handed to every task that talks to the API.
///
/// # Example
///
/// ```no_run
/// use estate_api_client::{ApiClient, ClientConfig};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Profile {
///     email: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::create(
///     ClientConfig::new("http://localhost:8000/api")
///         .with_on_token_refresh(|token| println!("persist {token}"))
///         .with_on_auth_error(|error| eprintln!("session ended: {error}")),
/// )?;
///
/// let profile = client.get::<(), Profile>("/user/profile").call(()).await?;
/// println!("{}", profile.email);
///
/// client.dispose();
/// # Ok(())
/// # }
/// ```
pub struct ApiClient<E = HttpTransport> {
    executor: TokenRefresh<E>,
}

impl ApiClient<HttpTransport> {
    /// Create a client over HTTP.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingBaseUrl` if no base URL is configured
    /// - `ConfigError::InvalidBaseUrl` if it is not an absolute http(s) URL
    /// - `ConfigError::Client` if the HTTP client cannot be built
    pub fn create(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.transport_config())?;

        tracing::info!(
            base_url = %transport.base_url(),
            timeout_ms = config.timeout.as_millis(),
            restored_token = config.access_token.is_some(),
            "API client created"
        );

        let mut layer = TokenRefreshLayer::new(config.refresh, config.hooks);
        if let Some(token) = config.access_token {
            layer = layer.with_access_token(token.expose());
        }

        Ok(Self {
            executor: layer.layer(transport),
        })
    }
}

impl<E> ApiClient<E>
where
    E: RequestExecutor + 'static,
{
    /// Create a client over any executor.
    ///
    /// Used to run the session logic against a scripted executor in tests.
    #[must_use]
    pub fn with_executor(next: E, refresh: RefreshConfig, hooks: SessionHooks) -> Self {
        Self {
            executor: TokenRefreshLayer::new(refresh, hooks).layer(next),
        }
    }

    /// `GET` endpoint; the payload becomes query parameters.
    #[must_use]
    pub fn get<Req, Res>(&self, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        self.endpoint(Method::GET, path)
    }

    /// `POST` endpoint.
    #[must_use]
    pub fn post<Req, Res>(&self, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        self.endpoint(Method::POST, path)
    }

    /// `PUT` endpoint.
    #[must_use]
    pub fn put<Req, Res>(&self, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        self.endpoint(Method::PUT, path)
    }

    /// `PATCH` endpoint.
    #[must_use]
    pub fn patch<Req, Res>(&self, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        self.endpoint(Method::PATCH, path)
    }

    /// `DELETE` endpoint.
    #[must_use]
    pub fn delete<Req, Res>(&self, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        self.endpoint(Method::DELETE, path)
    }

    /// Endpoint for an arbitrary method.
    #[must_use]
    pub fn endpoint<Req, Res>(&self, method: Method, path: impl Into<String>) -> Endpoint<Req, Res, E> {
        Endpoint::new(self.executor.clone(), method, path.into())
    }

    /// Send a prepared request through the session middleware.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any failure.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.executor.execute(request).await
    }
}

impl<E> ApiClient<E> {
    /// Store an access token, e.g. one restored from storage.
    pub fn set_access_token(&self, token: impl Into<String>) {
        self.executor.set_access_token(token);
    }

    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.executor.access_token()
    }

    /// Forget the access token.
    pub fn clear_access_token(&self) {
        self.executor.clear_access_token();
    }

    /// Returns `true` if an access token is held.
    ///
    /// The token is not validated; the server may still reject it.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.executor.access_token().is_some()
    }

    /// Whether a token refresh is in flight.
    #[must_use]
    pub fn refresh_phase(&self) -> RefreshPhase {
        self.executor.phase()
    }

    /// End this handle's use of the session.
    ///
    /// Clears the access token shared with every clone. Requests already in
    /// flight finish normally; later requests on other clones go out
    /// unauthenticated.
    pub fn dispose(self) {
        self.executor.clear_access_token();
        tracing::info!("API client disposed");
    }
}

impl<E> Clone for ApiClient<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
        }
    }
}

impl<E> std::fmt::Debug for ApiClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("executor", &self.executor)
            .finish()
    }
}
