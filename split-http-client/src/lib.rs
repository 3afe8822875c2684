//! # Split HTTP Client
//!
//! HTTP client for the Split admin API with a client-wide deadline and
//! transparent handling of rate-limit responses.
//!
//! ## Features
//!
//! - **Deadline**: A wall-clock budget starts when the client is built; once
//!   it elapses every call fails fast with no network I/O
//! - **Rate limiting**: `429 Too Many Requests` is retried after the reset
//!   window the server advertises, bounded only by the deadline
//! - **Authentication**: Either a bearer token or an `x-api-key` header, never both
//! - **Pluggable transport**: Requests go through the [`Transport`] trait so
//!   tests can count and script exchanges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use split_http_client::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .bearer_auth("my-admin-key")
//!         .client_timeout(Duration::from_secs(60))
//!         .build();
//!
//!     let client = HttpClient::new(config)?;
//!
//!     let response = client
//!         .get("/workspaces")
//!         .query("limit", "20")
//!         .send()
//!         .await?
//!         .error_for_status()?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod config;
mod deadline;
mod error;
mod rate_limit;
mod request;
mod response;
mod transport;

pub use auth::{API_KEY_HEADER, Auth};
pub use client::HttpClient;
pub use config::{
    DEFAULT_BASE_URL, DEFAULT_CLIENT_TIMEOUT, HttpClientConfig, HttpClientConfigBuilder,
};
pub use deadline::Deadline;
pub use error::{HttpClientError, Result};
pub use rate_limit::{IP_RESET_HEADER, ORG_RESET_HEADER, RateLimitHint, RateLimitScope};
pub use request::RequestBuilder;
pub use response::Response;
pub use transport::{HttpRequest, ReqwestTransport, Transport};

// Re-export commonly used types
pub use http::{Method, StatusCode};
