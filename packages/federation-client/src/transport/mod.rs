//! HTTP transport for the federation REST API.
//!
//! [`ApiClient`] attaches the bearer token and CSRF header, retries once on
//! a CSRF mismatch, and maps every failure into [`crate::FederationError`].

pub mod client;
pub mod csrf;
pub mod response;

pub use client::{league_deletion_path, ApiClient};
pub use csrf::{xsrf_from_headers, CSRF_COOKIE_PATH, XSRF_COOKIE, XSRF_HEADER};
pub use response::{map_status, GENERAL_FIELD};
