//! API keys.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{EntityRef, EnvironmentRef, WorkspaceRef};
use crate::client::{SplitClient, escape};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::Result;

/// Key types the API accepts.
pub const API_KEY_TYPES: &[&str] = &["client_side", "server_side", "admin"];

/// Roles that can be granted to an admin key.
pub const API_KEY_ROLES: &[&str] = &[
    "API_ALL_GRANTED",
    "API_APIKEY",
    "API_ADMIN",
    "API_WORKSPACE_ADMIN",
    "API_FEATURE_FLAG_VIEWER",
    "API_FEATURE_FLAG_EDITOR",
    "API_SEGMENT_VIEWER",
    "API_SEGMENT_EDITOR",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRequest {
    pub name: String,
    pub api_key_type: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub environments: Vec<EnvironmentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceRef>,
}

impl ApiKeyRequest {
    pub fn new(name: impl Into<String>, api_key_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key_type: api_key_type.into(),
            roles: Vec::new(),
            environments: Vec::new(),
            workspace: None,
        }
    }

    pub fn workspace(mut self, id: impl Into<String>) -> Self {
        self.workspace = Some(EntityRef::new("workspace", id));
        self
    }

    pub fn environment(mut self, id: impl Into<String>) -> Self {
        self.environments.push(EntityRef::new("environment", id));
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Check the key type and roles against the values the API accepts.
    pub fn validate(&self) -> Result<()> {
        if !API_KEY_TYPES.contains(&self.api_key_type.as_str()) {
            return Err(ApiError::validation(
                "api_key_type",
                format!("{:?} is not one of {}", self.api_key_type, API_KEY_TYPES.join(", ")),
            ));
        }
        if let Some(role) = self.roles.iter().find(|r| !API_KEY_ROLES.contains(&r.as_str())) {
            return Err(ApiError::validation("roles", format!("unknown role {:?}", role)));
        }
        if self.name.is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        Ok(())
    }
}

/// A created key. The secret is only returned on creation.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub api_key_type: Option<String>,
    #[serde(default)]
    pub key: String,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("roles", &self.roles)
            .field("api_key_type", &self.api_key_type)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// API key operations.
pub struct ApiKeysService<'a> {
    client: &'a SplitClient,
}

impl<'a> ApiKeysService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    /// Create a key. Invalid types or roles are rejected without a request.
    pub async fn create(&self, request: &ApiKeyRequest) -> Result<ApiResponse<ApiKey>> {
        request.validate()?;
        info!(name = %request.name, api_key_type = %request.api_key_type, "creating api key");
        self.client.fetch(self.client.http().post("/apiKeys").json(request)).await
    }

    /// Revoke a key by its secret value.
    pub async fn delete(&self, key: &str) -> Result<ApiResponse<()>> {
        info!("revoking api key");
        let path = format!("/apiKeys/{}", escape(key));
        self.client.execute(self.client.http().delete(path)).await
    }
}
