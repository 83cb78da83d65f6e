//! Token refresh configuration.

use crate::constants::{paths, BEARER_PREFIX, PUBLIC_PATHS};
use estate_api_core::header::{HeaderName, AUTHORIZATION};
use estate_api_core::ApiError;

/// Token refresh middleware configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Path of the refresh endpoint.
    ///
    /// Default: `/auth/refresh-token`
    pub refresh_path: String,

    /// Paths that bypass the middleware entirely.
    ///
    /// Requests to these paths carry no `Authorization` header, and an
    /// authentication failure on them never triggers a refresh.
    ///
    /// Default: login, register, password reset, password reset confirm, refresh
    pub public_paths: Vec<String>,

    /// How many refresh-and-replay cycles one request may go through.
    ///
    /// Default: 1
    pub max_refresh_attempts: u32,

    /// Response statuses that mean "credentials expired or invalid".
    ///
    /// Default: `[401]`
    pub auth_failure_statuses: Vec<u16>,

    /// Header carrying the access token.
    ///
    /// Default: `Authorization`
    pub header_name: HeaderName,

    /// Prefix placed before the token in the header value.
    ///
    /// Default: `"Bearer "`
    pub header_prefix: String,
}

impl RefreshConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refresh endpoint path.
    ///
    /// The path is also added to the public paths.
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.public_paths.contains(&path) {
            self.public_paths.push(path.clone());
        }
        self.refresh_path = path;
        self
    }

    /// Add a public (pre-authentication) path.
    #[must_use]
    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn with_max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.max_refresh_attempts = attempts;
        self
    }

    /// Set the statuses that trigger a refresh.
    #[must_use]
    pub fn with_auth_failure_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.auth_failure_statuses = statuses;
        self
    }

    /// Set the header name and value prefix.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, prefix: impl Into<String>) -> Self {
        self.header_name = name;
        self.header_prefix = prefix.into();
        self
    }

    /// Returns `true` if `path` bypasses the middleware.
    ///
    /// Any query string and trailing slash are ignored.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.public_paths
            .iter()
            .any(|public| normalize_path(public) == path)
    }

    /// Returns `true` if `error` should trigger a refresh.
    #[must_use]
    pub fn requires_refresh(&self, error: &ApiError) -> bool {
        self.auth_failure_statuses
            .iter()
            .any(|status| error.has_status(*status))
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_path: paths::REFRESH_TOKEN.to_string(),
            public_paths: PUBLIC_PATHS.iter().map(|p| (*p).to_string()).collect(),
            max_refresh_attempts: 1,
            auth_failure_statuses: vec![401],
            header_name: AUTHORIZATION,
            header_prefix: BEARER_PREFIX.to_string(),
        }
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
