//! Provider error types.

use split_api::ApiError;
use split_config::ConfigError;
use thiserror::Error;

use crate::definition::DefinitionError;
use crate::segment_keys::ReconcileError;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider errors.
///
/// Each variant renders as one diagnostic line naming the entity and the
/// operation that failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider configuration is missing or invalid.
    #[error("invalid provider configuration: {0}")]
    Config(#[from] ConfigError),

    /// The resource cannot be managed with a harness token.
    #[error("resource {resource} is not supported with harness_token; use the Harness provider")]
    UnsupportedWithHarnessToken {
        /// Resource name, e.g. `split_group` or `split_api_key (type admin)`.
        resource: String,
    },

    /// An import id did not have the expected number of parts.
    #[error(
        "import id {id:?} requires {expected} parts separated by a colon, e.g. {example}"
    )]
    InvalidImportId {
        id: String,
        expected: usize,
        example: &'static str,
    },

    /// A resource argument was rejected before any request was sent.
    #[error("invalid {field} {value:?}: {message}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        message: String,
    },

    /// A rollout definition failed local validation.
    #[error("split definition {split} in environment {environment_id}: {source}")]
    Definition {
        split: String,
        environment_id: String,
        #[source]
        source: DefinitionError,
    },

    /// Segment keys could not be reconciled.
    #[error(transparent)]
    SegmentKeys(#[from] ReconcileError),

    /// An admin API call failed.
    #[error("unable to {operation}: {source}")]
    Api {
        /// What was attempted, e.g. `fetch split definition new_checkout`.
        operation: String,
        #[source]
        source: ApiError,
    },
}

impl ProviderError {
    pub(crate) fn api(operation: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            field,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Check if the remote entity does not exist.
    ///
    /// Lifecycle drivers use this to drop a resource from state instead of
    /// failing the read.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { source, .. } => source.is_not_found(),
            Self::SegmentKeys(e) => e.api_error().is_some_and(ApiError::is_not_found),
            _ => false,
        }
    }
}
