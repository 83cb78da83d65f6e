//! Authentication constants.
//!
//! Endpoint paths of the authentication API, relative to the client's base URL.

/// Endpoint paths.
pub mod paths {
    /// Exchange credentials for an access token; sets the refresh cookie.
    pub const LOGIN: &str = "/auth/login";

    /// Create an account; sets the refresh cookie.
    pub const REGISTER: &str = "/auth/register";

    /// Invalidate the session server-side.
    pub const LOGOUT: &str = "/auth/logout";

    /// Request a password reset email.
    pub const PASSWORD_RESET: &str = "/auth/password-reset";

    /// Confirm a password reset with the emailed token.
    pub const PASSWORD_RESET_CONFIRM: &str = "/auth/password-reset/confirm";

    /// Issue a new access token from the HttpOnly refresh cookie.
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
}

/// Paths that are called before authentication and never carry a bearer token.
pub const PUBLIC_PATHS: [&str; 5] = [
    paths::LOGIN,
    paths::REGISTER,
    paths::PASSWORD_RESET,
    paths::PASSWORD_RESET_CONFIRM,
    paths::REFRESH_TOKEN,
];

/// Prefix placed before the access token in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";
