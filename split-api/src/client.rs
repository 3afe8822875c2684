//! Admin API client and shared request plumbing.

use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::de::DeserializeOwned;
use split_config::{Credential, ProviderConfig};
use split_http_client::{Auth, HttpClient, HttpClientConfig, RequestBuilder, Transport};
use tracing::debug;

use crate::services::{
    ApiKeysService, AttributesService, EnvironmentsService, FlagSetsService, GroupsService,
    SegmentsService, SplitsService, TrafficTypesService, UsersService, WorkspacesService,
};
use crate::{ApiError, ApiResponse, Result};

/// Client for the Split admin API.
///
/// Cheap to clone; clones share the same deadline.
#[derive(Clone)]
pub struct SplitClient {
    http: HttpClient,
    flag_sets_url: Arc<str>,
}

impl SplitClient {
    /// Build a client from the provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = HttpClient::new(http_config(config)?)?;
        Ok(Self::from_parts(http, config))
    }

    /// Build a client that sends through a custom transport.
    pub fn with_transport(config: &ProviderConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let http_config = http_config(config)?;
        http_config.validate()?;
        let http = HttpClient::with_transport(http_config, transport);
        Ok(Self::from_parts(http, config))
    }

    fn from_parts(http: HttpClient, config: &ProviderConfig) -> Self {
        debug!(
            base_url = %config.base_url,
            client_timeout_secs = config.client_timeout.as_secs(),
            harness_token = config.uses_harness_token(),
            "split admin client created"
        );
        Self {
            http,
            flag_sets_url: Arc::from(config.flag_sets_url.trim_end_matches('/')),
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// API keys.
    pub fn api_keys(&self) -> ApiKeysService<'_> {
        ApiKeysService::new(self)
    }

    /// Traffic type attributes.
    pub fn attributes(&self) -> AttributesService<'_> {
        AttributesService::new(self)
    }

    /// Environments and the segment keys configured in them.
    pub fn environments(&self) -> EnvironmentsService<'_> {
        EnvironmentsService::new(self)
    }

    /// Flag sets.
    pub fn flag_sets(&self) -> FlagSetsService<'_> {
        FlagSetsService::new(self)
    }

    /// Groups.
    pub fn groups(&self) -> GroupsService<'_> {
        GroupsService::new(self)
    }

    /// Segments.
    pub fn segments(&self) -> SegmentsService<'_> {
        SegmentsService::new(self)
    }

    /// Splits and their per-environment definitions.
    pub fn splits(&self) -> SplitsService<'_> {
        SplitsService::new(self)
    }

    /// Traffic types.
    pub fn traffic_types(&self) -> TrafficTypesService<'_> {
        TrafficTypesService::new(self)
    }

    /// Users.
    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    /// Workspaces.
    pub fn workspaces(&self) -> WorkspacesService<'_> {
        WorkspacesService::new(self)
    }

    pub(crate) fn flag_sets_url(&self, path: &str) -> String {
        format!("{}{}", self.flag_sets_url, path)
    }

    /// Send a request and decode a JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder<'_>,
    ) -> Result<ApiResponse<T>> {
        let response = request.send().await?.error_for_status()?;
        let data = response.json()?;
        Ok(ApiResponse {
            data,
            status: response.status(),
            headers: response.headers().clone(),
        })
    }

    /// Send a request whose body is not needed.
    pub(crate) async fn execute(&self, request: RequestBuilder<'_>) -> Result<ApiResponse<()>> {
        let response = request.send().await?.error_for_status()?;
        Ok(ApiResponse {
            data: (),
            status: response.status(),
            headers: response.headers().clone(),
        })
    }
}

impl std::fmt::Debug for SplitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitClient")
            .field("base_url", &self.http.config().base_url)
            .field("flag_sets_url", &self.flag_sets_url)
            .finish()
    }
}

/// Map the provider configuration onto the HTTP client configuration.
fn http_config(config: &ProviderConfig) -> Result<HttpClientConfig> {
    let credential = config
        .credential()
        .map_err(|e| ApiError::validation("credential", e.to_string()))?;
    let auth = match credential {
        Credential::HarnessToken(token) => Auth::api_key(token),
        Credential::ApiKey(key) => Auth::bearer(key),
    };

    let mut builder = HttpClientConfig::builder()
        .base_url(config.base_url.clone())
        .client_timeout(config.client_timeout)
        .request_timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .auth(auth);

    for (name, value) in &config.headers {
        builder = builder.default_header(name.clone(), value.clone());
    }

    Ok(builder.build())
}

/// Bytes escaped inside one path segment: the URL path set plus `/` and `%`.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Escape user supplied text for use as a single path segment.
pub(crate) fn escape(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
