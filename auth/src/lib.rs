//! # Estate API Authentication
//!
//! Access-token handling for the Estate API client.
//!
//! ## Features
//!
//! - **Bearer attachment**: every non-public request carries the current token
//! - **Single-flight refresh**: concurrent `401`s share one refresh call
//! - **Bounded replay**: one refresh-and-replay per request by default
//! - **Lifecycle hooks**: persist refreshed tokens, force logout on failure
//!
//! The refresh token itself is never visible here. It is an HttpOnly cookie
//! carried by the transport's cookie store.
//!
//! ## Example
//!
//! ```no_run
//! use estate_api_auth::{RefreshConfig, SessionHooks, TokenRefreshLayer};
//! use estate_api_core::{ApiRequest, Layer, RequestExecutor};
//! use estate_api_transport::{HttpTransport, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(TransportConfig::new("http://localhost:8000/api"))?;
//!
//! let hooks = SessionHooks::new()
//!     .with_on_token_refresh(|token| println!("persist {token}"))
//!     .with_on_auth_error(|error| eprintln!("logged out: {error}"));
//!
//! let executor = TokenRefreshLayer::new(RefreshConfig::default(), hooks).layer(transport);
//! executor.set_access_token("stored-token");
//!
//! let profile = executor.execute(ApiRequest::get("/user/profile")).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod constants;
pub mod credential;
pub mod hooks;
pub mod refresh;

pub use config::RefreshConfig;
pub use constants::{paths, BEARER_PREFIX, PUBLIC_PATHS};
pub use credential::{AccessToken, RefreshResponse};
pub use hooks::{AuthErrorHook, SessionHooks, TokenRefreshHook};
pub use refresh::{RefreshPhase, TokenRefresh, TokenRefreshLayer};
