//! Typed handlers for the Estate API endpoints.
//!
//! Each handler is a method on [`ApiClient`](crate::ApiClient); the request
//! and response types live in the submodules.

pub mod auth;
pub mod site_settings;
