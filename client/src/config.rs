//! Client configuration.

use estate_api_auth::{AccessToken, RefreshConfig, SessionHooks};
use estate_api_core::{ApiError, HeaderMap};
use estate_api_transport::{ConfigError, TransportConfig, DEFAULT_TIMEOUT};
use std::time::Duration;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "ESTATE_API_URL";

/// Environment variable holding the request timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "ESTATE_API_TIMEOUT_MS";

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request origin, e.g. `http://localhost:8000/api`.
    pub base_url: String,

    /// Per-request deadline.
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Headers sent with every request.
    ///
    /// Default: `Content-Type: application/json`
    pub headers: HeaderMap,

    /// Token refresh behavior.
    pub refresh: RefreshConfig,

    /// Session lifecycle callbacks.
    pub hooks: SessionHooks,

    /// Access token restored from storage, if any.
    pub access_token: Option<AccessToken>,
}

impl ClientConfig {
    /// Create configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let transport = TransportConfig::new(base_url);
        Self {
            base_url: transport.base_url,
            timeout: transport.timeout,
            headers: transport.headers,
            refresh: RefreshConfig::default(),
            hooks: SessionHooks::default(),
            access_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `ESTATE_API_URL` (required)
    /// - `ESTATE_API_TIMEOUT_MS` (optional, default 30000)
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingEnvVar` if `ESTATE_API_URL` is not set
    /// - `ConfigError::InvalidTimeout` if `ESTATE_API_TIMEOUT_MS` is not a number
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_ENV).ok_or(ConfigError::MissingEnvVar(BASE_URL_ENV))?;

        let timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidTimeout(format!("{raw:?}: {e}")))?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self::new(base_url).with_timeout(timeout))
    }

    /// Set the per-request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a default header.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidHeader` if the name or value is invalid.
    pub fn with_header(self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let mut transport = self.transport_config().with_header(name, value)?;
        Ok(Self {
            headers: std::mem::take(&mut transport.headers),
            ..self
        })
    }

    /// Replace the token refresh configuration.
    #[must_use]
    pub fn with_refresh(mut self, refresh: RefreshConfig) -> Self {
        self.refresh = refresh;
        self
    }

    /// Called with the new access token after every successful refresh.
    #[must_use]
    pub fn with_on_token_refresh<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_on_token_refresh(hook);
        self
    }

    /// Called once when the session cannot be recovered.
    #[must_use]
    pub fn with_on_auth_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_on_auth_error(hook);
        self
    }

    /// Start with a previously persisted access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(AccessToken::new(token));
        self
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            headers: self.headers.clone(),
        }
    }
}
