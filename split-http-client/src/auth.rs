//! Authentication header schemes.

use crate::{HttpClientError, Result};
use http::header::{AUTHORIZATION, HeaderName};
use http::{HeaderMap, HeaderValue};
use std::fmt;

/// Header carrying the API key when key-based authentication is used.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication scheme for a client.
///
/// A client carries at most one scheme; the two are never merged.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `x-api-key: <key>`.
    ApiKey(String),
}

impl Auth {
    /// Create a bearer token scheme.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Create an API key header scheme.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(key.into())
    }

    /// The header name and value this scheme sends.
    pub fn header(&self) -> Result<(HeaderName, HeaderValue)> {
        let (name, value) = match self {
            Self::Bearer(token) => (AUTHORIZATION, format!("Bearer {}", token)),
            Self::ApiKey(key) => (HeaderName::from_static(API_KEY_HEADER), key.clone()),
        };

        let mut value = HeaderValue::from_str(&value).map_err(|e| HttpClientError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        value.set_sensitive(true);

        Ok((name, value))
    }

    /// Insert this scheme's header, replacing any previous credential header.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.remove(AUTHORIZATION);
        headers.remove(API_KEY_HEADER);

        let (name, value) = self.header()?;
        headers.insert(name, value);
        Ok(())
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Auth::Bearer(<redacted>)"),
            Self::ApiKey(_) => f.write_str("Auth::ApiKey(<redacted>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let mut headers = HeaderMap::new();
        Auth::bearer("secret").apply(&mut headers).unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
        assert!(headers.get(API_KEY_HEADER).is_none());
    }

    #[test]
    fn test_api_key_header() {
        let mut headers = HeaderMap::new();
        Auth::api_key("pat.123").apply(&mut headers).unwrap();

        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "pat.123");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_schemes_are_exclusive() {
        let mut headers = HeaderMap::new();
        Auth::bearer("first").apply(&mut headers).unwrap();
        Auth::api_key("second").apply(&mut headers).unwrap();

        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "second");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Auth::bearer("top-secret"));
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn test_invalid_header_value() {
        let err = Auth::bearer("bad\nvalue").header().unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidHeader { .. }));
    }
}
