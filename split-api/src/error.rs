//! Admin API error types.

use http::StatusCode;
use split_http_client::HttpClientError;
use thiserror::Error;

/// Result type for admin API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Admin API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A lookup over a listing found no matching item.
    #[error("{kind} [{key}] not found")]
    NotFound {
        /// Entity kind, e.g. `workspace`.
        kind: &'static str,
        /// The identifier or name that was looked for.
        key: String,
    },

    /// A request was rejected locally before it was sent.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The client or the remote API failed the call.
    #[error(transparent)]
    Http(#[from] HttpClientError),
}

impl ApiError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Check if this is a not-found error, local or remote.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            other => other.status() == Some(StatusCode::NOT_FOUND),
        }
    }

    /// Check if the client deadline elapsed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_deadline_exceeded())
    }

    /// HTTP status returned by the remote API, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => e.status_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::time::Duration;

    #[test]
    fn test_not_found_message_carries_key() {
        let err = ApiError::not_found("environment", "z");
        assert_eq!(err.to_string(), "environment [z] not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remote_404_is_not_found() {
        let err = ApiError::from(HttpClientError::Status {
            method: Method::GET,
            url: "https://api.split.io/internal/api/v2/segments/ws/1/beta".to_string(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_deadline_passthrough() {
        let err = ApiError::from(HttpClientError::DeadlineExceeded {
            timeout: Duration::from_secs(1),
        });
        assert!(err.is_deadline_exceeded());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "reached maximum client timeout of 1s");
    }
}
