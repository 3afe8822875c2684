//! HTTP client configuration.

use crate::auth::Auth;
use crate::{HttpClientError, Result};
use std::time::Duration;

/// Default base URL of the admin API.
pub const DEFAULT_BASE_URL: &str = "https://api.split.io/internal/api/v2";

/// Default client-wide time budget.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL that relative request paths are appended to.
    pub base_url: String,
    /// Wall-clock budget for every call made through the client, measured
    /// from client construction.
    pub client_timeout: Duration,
    /// Timeout of a single HTTP exchange.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Credential header scheme.
    pub auth: Option<Auth>,
    /// Default headers for all requests.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Content-Type header.
    pub content_type: String,
    /// Accept header.
    pub accept: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            auth: None,
            default_headers: Vec::new(),
            user_agent: format!("split-http-client/{}", env!("CARGO_PKG_VERSION")),
            content_type: "application/json".to_string(),
            accept: "application/json".to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Check the configuration before a client is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.ends_with('/') {
            return Err(HttpClientError::Config(
                "custom base URL cannot contain a trailing slash".to_string(),
            ));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        Ok(())
    }
}

/// Builder for HTTP client configuration.
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL for all requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the client-wide time budget.
    pub fn client_timeout(mut self, timeout: Duration) -> Self {
        self.config.client_timeout = timeout;
        self
    }

    /// Set the timeout of a single request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Authenticate with a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.config.auth = Some(Auth::bearer(token));
        self
    }

    /// Authenticate with an `x-api-key` header.
    pub fn api_key_auth(mut self, key: impl Into<String>) -> Self {
        self.config.auth = Some(Auth::api_key(key));
        self
    }

    /// Set the authentication scheme.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.config.auth = Some(auth);
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the Content-Type header.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.config.content_type = content_type.into();
        self
    }

    /// Set the Accept header.
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.config.accept = accept.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.client_timeout, Duration::from_secs(300));
        assert!(config.auth.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_last_auth_wins() {
        let config = HttpClientConfig::builder()
            .bearer_auth("one")
            .api_key_auth("two")
            .build();
        assert_eq!(config.auth, Some(Auth::api_key("two")));
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let config = HttpClientConfig::builder()
            .base_url("https://api.example.com/v2/")
            .build();
        assert!(matches!(config.validate(), Err(HttpClientError::Config(_))));
    }

    #[test]
    fn test_unparsable_base_url_rejected() {
        let config = HttpClientConfig::builder().base_url("not a url").build();
        assert!(matches!(config.validate(), Err(HttpClientError::InvalidUrl(_))));
    }
}
