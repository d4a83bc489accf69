#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Outbound HTTP client for catalog lookups
//!
//! This crate provides a small hyper-based HTTP client with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - A per-request timeout covering connect, headers and body
//! - A response body size limit
//! - Non-2xx statuses surfaced as [`HttpError::HttpStatus`]
//!
//! The client performs exactly one attempt per call. Retrying is left to
//! the caller.
//!
//! # Example
//!
//! ```ignore
//! use lookup_http::{HttpClient, HttpClientConfig};
//!
//! let client = HttpClient::with_config(HttpClientConfig::default())?;
//! let body = client
//!     .send(
//!         http::Method::POST,
//!         "https://api.example.com/search",
//!         &[("content-type".to_owned(), "application/json".to_owned())],
//!         bytes::Bytes::from_static(b"{}"),
//!     )
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod tls;

pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TlsRootConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
