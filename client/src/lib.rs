//! # Estate API Client
//!
//! Typed, session-aware client for the Estate API.
//!
//! The client is a stack of executors:
//!
//! ```text
//! ApiClient / Endpoint ──▶ TokenRefresh ──▶ HttpTransport ──▶ server
//!   typed payloads          bearer token     reqwest, cookies
//!                           401 → refresh    error normalization
//! ```
//!
//! Every failure reaches the caller as one [`ApiError`] shape. Callers branch
//! on [`ApiError::code`].
//!
//! ## Example
//!
//! ```no_run
//! use estate_api_client::handlers::auth::LoginData;
//! use estate_api_client::{ApiClient, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::create(ClientConfig::from_env()?)?;
//!
//! client.login(LoginData::new("anna@example.com", "secret")).await?;
//! let info = client.site_info().await?;
//! println!("{}", info.org_name);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod handlers;

pub use client::ApiClient;
pub use config::{ClientConfig, BASE_URL_ENV, TIMEOUT_ENV};
pub use endpoint::Endpoint;

pub use estate_api_auth::{RefreshConfig, RefreshPhase, SessionHooks};
pub use estate_api_core::{codes, ApiError, ApiRequest, ApiResponse, ErrorKind, Method, Result};
pub use estate_api_transport::ConfigError;
