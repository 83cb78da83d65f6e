//! Construction-time errors.
//!
//! Request failures never use this type; they are normalized into
//! [`estate_api_core::ApiError`].

use thiserror::Error;

/// Errors raised while building a transport or client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No base URL was configured.
    #[error("Missing base URL: the client must be created with a base URL")]
    MissingBaseUrl,

    /// The base URL is not an absolute http(s) URL.
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A required environment variable is not set.
    #[error("Missing {0} environment variable")]
    MissingEnvVar(&'static str),

    /// The configured timeout is not a valid number of milliseconds.
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// A default header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client construction failed: {0}")]
    Client(String),
}
