//! Transport configuration.

use crate::error::ConfigError;
use estate_api_core::{HeaderMap, HeaderValue};
use reqwest::header::{HeaderName, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;

/// Per-request deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request origin, e.g. `https://example.com/api`.
    ///
    /// Request paths are appended to it verbatim.
    pub base_url: String,

    /// Per-request deadline.
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Headers sent with every request.
    ///
    /// Default: `Content-Type: application/json`
    pub headers: HeaderMap,
}

impl TransportConfig {
    /// Create new transport configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Request origin (e.g. "http://localhost:8000/api")
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers,
        }
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
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Validate the base URL and return it without a trailing slash.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingBaseUrl` if the base URL is empty
    /// - `ConfigError::InvalidBaseUrl` if it is not an absolute http(s) URL
    pub fn validated_base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason,
        };

        let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("base URL must not carry a query or fragment".to_string()));
        }

        Ok(trimmed.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::new("http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(
            config.headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = TransportConfig::new("https://example.com/api/");
        assert_eq!(config.validated_base_url().unwrap(), "https://example.com/api");
    }

    #[test]
    fn test_empty_base_url_is_missing() {
        let config = TransportConfig::new("  ");
        assert_eq!(config.validated_base_url(), Err(ConfigError::MissingBaseUrl));
    }

    #[test]
    fn test_relative_or_foreign_base_url_is_rejected() {
        assert!(matches!(
            TransportConfig::new("/api").validated_base_url(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            TransportConfig::new("ftp://example.com").validated_base_url(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let result = TransportConfig::new("http://localhost").with_header("bad header", "x");
        assert!(matches!(result, Err(ConfigError::InvalidHeader(_))));
    }
}
