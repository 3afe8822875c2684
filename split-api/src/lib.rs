//! Typed services for the Split admin API.
//!
//! [`SplitClient`] wraps the deadline-bounded HTTP client and hands out one
//! borrowed service per entity type. Every operation returns the decoded
//! body together with the status and headers it arrived with, so callers
//! can report diagnostics without reaching into the transport.
//!
//! Some entities have no single-item endpoint. Their `find_by_*` helpers
//! scan the full listing and fail with [`ApiError::NotFound`] carrying the
//! key that was looked for.
//!
//! # Quick Start
//!
//! ```no_run
//! use split_api::SplitClient;
//! use split_config::ProviderConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::builder().api_key("admin-api-key").build();
//! let client = SplitClient::new(&config)?;
//!
//! let workspace = client.workspaces().find_by_name("Default").await?.data;
//! let environments = client.environments().list(&workspace.id).await?.data;
//! for env in environments {
//!     println!("{} production={}", env.name, env.production);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod definition;
mod error;
mod response;
pub mod services;

pub use client::SplitClient;
pub use definition::{
    Between, Bucket, Combiner, Condition, Dependency, MATCHER_TYPES, Matcher, MatcherError,
    MatcherField, MatcherKind, MatcherWire, Rule, SplitDefinition, SplitDefinitionRequest,
    Treatment,
};
pub use error::{ApiError, Result};
pub use response::{ApiResponse, ListParams, ListResult, MarkerPage};
pub use services::*;
