//! Normalized error type for every failure the client can surface.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Machine-readable codes attached to errors synthesized by the client.
///
/// Errors passed through from a Problem-Details body keep whatever `code`
/// the server sent (possibly none).
pub mod codes {
    /// Server responded with a non-conforming error body.
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// Request was sent but no response arrived.
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// Request could not be constructed or dispatched.
    pub const REQUEST_ERROR: &str = "REQUEST_ERROR";
    /// Successful response body did not match the expected shape.
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    /// The token refresh call itself failed.
    pub const AUTH_REFRESH_FAILED: &str = "AUTH_REFRESH_FAILED";
    /// A replayed request was rejected again after a successful refresh.
    pub const AUTH_RETRY_EXHAUSTED: &str = "AUTH_RETRY_EXHAUSTED";
}

/// Discriminant of the normalized error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Server sent an authoritative Problem-Details body.
    ServerProblem,
    /// Server responded, but the body was not a Problem-Details object.
    ServerGeneric,
    /// Request was sent and no response arrived (DNS, timeout, reset).
    NetworkUnreachable,
    /// Request was never dispatched.
    ClientRequest,
    /// Token refresh failed or the retry budget was spent.
    AuthExhausted,
}

/// The one error shape that crosses the client boundary.
///
/// Modeled on RFC 7807 Problem Details. For [`ErrorKind::ServerProblem`] the
/// raw server body is retained verbatim in [`ApiError::payload`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{title} (status {status}): {detail}")]
pub struct ApiError {
    kind: ErrorKind,
    error_type: String,
    title: String,
    status: u16,
    detail: String,
    instance: String,
    code: Option<String>,
    payload: Option<Value>,
}

impl ApiError {
    /// Create a synthesized error with `type = "about:blank"`.
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        code: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: instance.into(),
            code: Some(code.to_string()),
            payload: None,
        }
    }

    /// Build a pass-through error from a Problem-Details body.
    ///
    /// Values are read leniently: a non-string field is rendered with its
    /// JSON text, and a non-numeric `status` falls back to `http_status`.
    #[must_use]
    pub fn from_problem(body: Value, http_status: u16) -> Self {
        let text = |key: &str| match body.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let status = body
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(http_status);

        let code = match body.get("code") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        Self {
            kind: ErrorKind::ServerProblem,
            error_type: text("type"),
            title: text("title"),
            status,
            detail: text("detail"),
            instance: text("instance"),
            code,
            payload: Some(body),
        }
    }

    /// Error for a `2xx` body that could not be decoded into the caller's type.
    #[must_use]
    pub fn decode(status: u16, detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ServerGeneric,
            codes::DECODE_ERROR,
            "Decode Error",
            status,
            detail,
            instance,
        )
    }

    /// Re-tag this error as [`ErrorKind::AuthExhausted`] with the given code.
    ///
    /// Authoritative Problem-Details errors, network errors and request errors
    /// are returned unchanged.
    #[must_use]
    pub fn into_auth_exhausted(self, code: &str) -> Self {
        match self.kind {
            ErrorKind::ServerGeneric => Self {
                kind: ErrorKind::AuthExhausted,
                title: "Authentication Error".to_string(),
                code: Some(code.to_string()),
                ..self
            },
            _ => self,
        }
    }

    /// Error taxonomy discriminant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Problem type URI (`about:blank` for synthesized errors).
    #[must_use]
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// Short human-readable summary.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// HTTP status, `0` when no response was received.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Human-readable explanation.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Request path the error originated from.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Machine-readable code callers branch on.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Raw server body for pass-through Problem-Details errors.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns `true` if the server answered with `401 Unauthorized`.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.has_status(401)
    }

    /// Returns `true` if a response was received with the given status.
    #[must_use]
    pub fn has_status(&self, status: u16) -> bool {
        matches!(self.kind, ErrorKind::ServerProblem | ErrorKind::ServerGeneric)
            && self.status == status
    }
}
