// Split Provider - declarative management of Split feature flags
//
// This library maps declarative resource definitions onto the Split admin
// API: rollout definitions of splits in environments and the keys assigned
// to segments, on top of typed API services and a deadline-bounded client.

pub mod definition;
pub mod definition_resource;
pub mod error;
pub mod import;
pub mod provider;
pub mod segment_keys;

pub use definition::{
    BetweenBlock, BucketBlock, ConditionBlock, DefinitionError, DependsBlock, MatcherBlock,
    RuleBlock, SplitDefinitionConfig, TreatmentBlock, decode, encode,
};
pub use definition_resource::{SplitDefinitionResource, SplitDefinitionState};
pub use error::{ProviderError, Result};
pub use import::parse_composite_id;
pub use provider::{Provider, validate_uuid};
pub use segment_keys::{
    MAX_SEGMENT_KEYS, ReconcileError, SEGMENT_KEYS_COMMENT, SegmentKeysApi, SegmentKeysResource,
    SegmentKeysState, reconcile,
};

// Re-export member crates
pub use split_api;
pub use split_config;
pub use split_http_client;
pub use split_log;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::definition::{SplitDefinitionConfig, decode, encode};
    pub use crate::error::{ProviderError, Result};
    pub use crate::provider::Provider;
    pub use crate::segment_keys::{SegmentKeysApi, reconcile};
    pub use split_api::{ApiError, ApiResponse, SplitClient};
    pub use split_config::ProviderConfig;
}
