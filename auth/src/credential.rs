//! Access token and refresh endpoint wire types.
//!
//! The refresh token never appears here: it lives in an HttpOnly cookie owned
//! by the transport's cookie store.

use serde::Deserialize;
use std::fmt;

/// Short-lived bearer credential presented on each request.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Body returned by the refresh endpoint.
///
/// The wire format also carries `refresh_token`; it is ignored because the
/// server keeps refresh state in its cookie.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    /// Status message
    #[serde(default)]
    pub message: String,
    /// Newly issued access token
    pub access_token: String,
}
