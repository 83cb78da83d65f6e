//! Session lifecycle hooks.

use estate_api_core::ApiError;
use std::fmt;
use std::sync::Arc;

/// Called with the new access token after a successful refresh.
pub type TokenRefreshHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Called when refresh fails or the retry budget is spent.
pub type AuthErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Callbacks the session owner registers to persist tokens and force logout.
///
/// Each refresh outcome fires exactly one hook exactly once, no matter how
/// many requests were waiting on it. Retry exhaustion fires `on_auth_error`
/// at most once per access token. A refresh that completes after the owner
/// replaced or cleared the token fires nothing.
#[derive(Clone, Default)]
pub struct SessionHooks {
    on_token_refresh: Option<TokenRefreshHook>,
    on_auth_error: Option<AuthErrorHook>,
}

impl SessionHooks {
    /// Create hooks that do nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token refresh callback.
    #[must_use]
    pub fn with_on_token_refresh<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_token_refresh = Some(Arc::new(hook));
        self
    }

    /// Set the authentication error callback.
    #[must_use]
    pub fn with_on_auth_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.on_auth_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn token_refreshed(&self, token: &str) {
        if let Some(hook) = &self.on_token_refresh {
            hook(token);
        }
    }

    pub(crate) fn auth_error(&self, error: &ApiError) {
        if let Some(hook) = &self.on_auth_error {
            hook(error);
        }
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_token_refresh", &self.on_token_refresh.is_some())
            .field("on_auth_error", &self.on_auth_error.is_some())
            .finish()
    }
}
