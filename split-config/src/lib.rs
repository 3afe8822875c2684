// Provider configuration for the Split admin API

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default admin API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.split.io/internal/api/v2";

/// Default base URL of the flag sets API.
pub const DEFAULT_FLAG_SETS_URL: &str = "https://api.split.io/api/v3";

/// Default client-wide time budget.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout of a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_API_KEY: &str = "SPLIT_API_KEY";
pub const ENV_HARNESS_TOKEN: &str = "HARNESS_TOKEN";
pub const ENV_BASE_URL: &str = "SPLIT_API_URL";
pub const ENV_FLAG_SETS_URL: &str = "SPLIT_FLAG_SETS_URL";
pub const ENV_CLIENT_TIMEOUT: &str = "SPLIT_CLIENT_TIMEOUT";
pub const ENV_REQUEST_TIMEOUT: &str = "SPLIT_REQUEST_TIMEOUT";

/// The single credential a client authenticates with.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Harness platform token, sent as `x-api-key`.
    HarnessToken(String),
    /// Split admin API key, sent as a bearer token.
    ApiKey(String),
}

impl Credential {
    /// Whether this is a Harness token.
    pub fn is_harness_token(&self) -> bool {
        matches!(self, Credential::HarnessToken(_))
    }

    /// The secret value.
    pub fn secret(&self) -> &str {
        match self {
            Credential::HarnessToken(token) => token,
            Credential::ApiKey(key) => key,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::HarnessToken(_) => f.write_str("HarnessToken(<redacted>)"),
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Provider configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Split admin API key
    pub api_key: Option<String>,
    /// Harness platform token; takes precedence over `api_key`
    pub harness_token: Option<String>,
    /// Admin API base URL, without a trailing slash
    pub base_url: String,
    /// Flag sets API base URL, without a trailing slash
    pub flag_sets_url: String,
    /// Wall-clock budget for all calls made by one client
    #[serde(with = "duration_secs")]
    pub client_timeout: Duration,
    /// Timeout of a single request
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Deleting an environment only forgets it instead of calling the API
    pub remove_environment_from_state_only: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            harness_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            flag_sets_url: DEFAULT_FLAG_SETS_URL.to_string(),
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("split-provider/{}", env!("CARGO_PKG_VERSION")),
            headers: BTreeMap::new(),
            remove_environment_from_state_only: false,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("harness_token", &redact(&self.harness_token))
            .field("base_url", &self.base_url)
            .field("flag_sets_url", &self.flag_sets_url)
            .field("client_timeout", &self.client_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field(
                "remove_environment_from_state_only",
                &self.remove_environment_from_state_only,
            )
            .finish()
    }
}

impl ProviderConfig {
    /// Create a configuration builder
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env(&EnvLoader::default())
    }

    /// Load `.env` first, then the process environment
    pub fn from_dotenv() -> Result<Self> {
        EnvLoader::load_dotenv()?;
        Self::from_env()
    }

    /// Load configuration from a `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = ConfigLoader::auto(path)?.load_as(path)?;
        tracing::debug!(path = %path.display(), "loaded provider configuration file");
        Ok(config)
    }

    /// Overlay variables that are set on top of this configuration
    pub fn merge_env(mut self, env: &EnvLoader) -> Result<Self> {
        if let Some(key) = env.load_optional(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(token) = env.load_optional(ENV_HARNESS_TOKEN) {
            self.harness_token = Some(token);
        }
        if let Some(url) = env.load_optional(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(url) = env.load_optional(ENV_FLAG_SETS_URL) {
            self.flag_sets_url = url;
        }
        if let Some(timeout) = env.load_duration_secs(ENV_CLIENT_TIMEOUT)? {
            self.client_timeout = timeout;
        }
        if let Some(timeout) = env.load_duration_secs(ENV_REQUEST_TIMEOUT)? {
            self.request_timeout = timeout;
        }
        Ok(self)
    }

    /// The credential requests are sent with
    ///
    /// A Harness token wins over an API key; the two are never combined.
    pub fn credential(&self) -> Result<Credential> {
        if let Some(token) = self.harness_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credential::HarnessToken(token.to_string()));
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(Credential::ApiKey(key.to_string()));
        }
        Err(ConfigError::KeyNotFound(format!(
            "{} or {}",
            ENV_API_KEY, ENV_HARNESS_TOKEN
        )))
    }

    /// Whether a Harness token is configured
    pub fn uses_harness_token(&self) -> bool {
        self.harness_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty_if_set(self.api_key.as_deref(), "api_key")?;
        ConfigValidator::not_empty_if_set(self.harness_token.as_deref(), "harness_token")?;
        self.credential()?;

        let urls = [
            (&self.base_url, "base_url"),
            (&self.flag_sets_url, "flag_sets_url"),
        ];
        for (value, field) in urls {
            ConfigValidator::is_url(value, field)?;
            ConfigValidator::no_trailing_slash(value, field)?;
        }

        ConfigValidator::non_zero(self.client_timeout, "client_timeout")?;
        ConfigValidator::non_zero(self.request_timeout, "request_timeout")?;
        ConfigValidator::not_empty(&self.user_agent, "user_agent")?;

        for name in self.headers.keys() {
            ConfigValidator::not_empty(name, "headers")?;
        }

        Ok(())
    }
}

/// Builder for provider configuration
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn harness_token(mut self, token: impl Into<String>) -> Self {
        self.config.harness_token = Some(token.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn flag_sets_url(mut self, url: impl Into<String>) -> Self {
        self.config.flag_sets_url = url.into();
        self
    }

    pub fn client_timeout(mut self, timeout: Duration) -> Self {
        self.config.client_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn remove_environment_from_state_only(mut self, enabled: bool) -> Self {
        self.config.remove_environment_from_state_only = enabled;
        self
    }

    pub fn build(self) -> ProviderConfig {
        self.config
    }
}

/// Durations written as whole seconds in config files
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
