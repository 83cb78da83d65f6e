//! # Estate API Transport
//!
//! HTTP transport for the Estate API client, built on `reqwest`.
//!
//! The transport executes one call against a base URL and maps every failure
//! into a normalized [`estate_api_core::ApiError`]. All requests are sent with
//! a cookie store enabled so the HttpOnly refresh cookie issued by the server
//! reaches the refresh endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use estate_api_core::{ApiRequest, RequestExecutor};
//! use estate_api_transport::{HttpTransport, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(TransportConfig::new("http://localhost:8000/api"))?;
//! let response = transport.execute(ApiRequest::get("/site-settings/contacts")).await?;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod http;

pub use config::{TransportConfig, DEFAULT_TIMEOUT};
pub use error::ConfigError;
pub use http::HttpTransport;
