//! Account handlers: registration, login, logout and password reset.

use crate::ApiClient;
use estate_api_auth::paths;
use estate_api_core::{RequestExecutor, Result};
use serde::{Deserialize, Serialize};

/// Account type chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Private buyer or seller
    Individual,
    /// Real estate agent acting for an organization
    Agent,
}

/// Authenticated user as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    /// User ID
    pub id: u64,
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Account type (`individual` or `agent`)
    pub user_type: String,
    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Organization name (agents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    /// Taxpayer identification number (agents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
}

/// Response to login and registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated user
    pub user: UserData,
    /// Access token for subsequent requests
    pub access_token: String,
    /// Refresh token; also set as an HttpOnly cookie
    #[serde(default)]
    pub refresh_token: String,
    /// Status message
    #[serde(default)]
    pub message: String,
    /// Whether the server keeps the refresh token in a cookie
    #[serde(default)]
    pub use_cookies: bool,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .field("message", &self.message)
            .field("use_cookies", &self.use_cookies)
            .finish_non_exhaustive()
    }
}

/// Registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    /// Account type
    pub user_type: UserType,
    /// Full name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Password
    pub password1: String,
    /// Password confirmation
    pub password2: String,
    /// Ask the server to keep the refresh token in a cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cookies: Option<bool>,
    /// Organization name (agents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    /// Taxpayer identification number (agents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Ask the server to keep the refresh token in a cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cookies: Option<bool>,
}

impl LoginData {
    /// Login form with cookie-backed refresh.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            use_cookies: Some(true),
        }
    }
}

/// Password reset request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetData {
    /// Account email address
    pub email: String,
}

/// Password reset confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetConfirmData {
    /// Token from the reset email
    pub token: String,
    /// New password
    pub new_password1: String,
    /// New password confirmation
    pub new_password2: String,
}

/// Plain status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message text
    pub message: String,
}

impl<E> ApiClient<E>
where
    E: RequestExecutor + 'static,
{
    /// Create an account and start a session.
    ///
    /// The returned access token is stored on the client.
    ///
    /// # Errors
    ///
    /// Returns the normalized error, e.g. a validation Problem-Details body.
    pub async fn register(&self, data: RegisterData) -> Result<AuthResponse> {
        let response = self
            .post::<RegisterData, AuthResponse>(paths::REGISTER)
            .call(data)
            .await?;
        self.set_access_token(response.access_token.as_str());
        tracing::info!(user_id = response.user.id, "Registered");
        Ok(response)
    }

    /// Log in and start a session.
    ///
    /// The returned access token is stored on the client.
    ///
    /// # Errors
    ///
    /// Returns the normalized error, e.g. invalid credentials.
    pub async fn login(&self, data: LoginData) -> Result<AuthResponse> {
        let response = self
            .post::<LoginData, AuthResponse>(paths::LOGIN)
            .call(data)
            .await?;
        self.set_access_token(response.access_token.as_str());
        tracing::info!(user_id = response.user.id, "Logged in");
        Ok(response)
    }

    /// End the session.
    ///
    /// The local access token is cleared whether or not the server call
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the server call.
    pub async fn logout(&self) -> Result<Message> {
        let result = self.post::<(), Message>(paths::LOGOUT).call(()).await;
        self.clear_access_token();
        match &result {
            Ok(_) => tracing::info!("Logged out"),
            Err(error) => tracing::warn!(status = error.status(), "Logout call failed, token cleared locally"),
        }
        result
    }

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns the normalized error.
    pub async fn request_password_reset(&self, data: PasswordResetData) -> Result<Message> {
        self.post(paths::PASSWORD_RESET).call(data).await
    }

    /// Set a new password using the emailed token.
    ///
    /// # Errors
    ///
    /// Returns the normalized error, e.g. an expired reset token.
    pub async fn confirm_password_reset(&self, data: PasswordResetConfirmData) -> Result<Message> {
        self.post(paths::PASSWORD_RESET_CONFIRM).call(data).await
    }
}
