//! Provider context.
//!
//! A [`Provider`] is built once from a validated [`ProviderConfig`] and
//! passed by reference to every resource. Nothing is stored globally.

use split_api::{ApiKey, ApiKeyRequest, ApiResponse, GroupsService, SplitClient};
use split_config::{ProviderConfig, Validate};
use split_http_client::Transport;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::definition_resource::SplitDefinitionResource;
use crate::segment_keys::SegmentKeysResource;
use crate::{ProviderError, Result};

/// Configured provider: the settings and the admin client built from them.
#[derive(Debug, Clone)]
pub struct Provider {
    config: Arc<ProviderConfig>,
    client: SplitClient,
}

impl Provider {
    /// Validate the configuration and build the admin client.
    ///
    /// The client deadline starts counting from here.
    pub fn configure(config: ProviderConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Like [`Provider::configure`], sending requests through `transport`.
    pub fn configure_with_transport(
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::build(config, Some(transport))
    }

    fn build(config: ProviderConfig, transport: Option<Arc<dyn Transport>>) -> Result<Self> {
        let installed = split_log::init();
        debug!(installed, "logging initialised");

        config.validate()?;

        let client = match transport {
            Some(transport) => SplitClient::with_transport(&config, transport),
            None => SplitClient::new(&config),
        }
        .map_err(|e| ProviderError::api("create admin client", e))?;

        info!(
            base_url = %config.base_url,
            harness_token = config.uses_harness_token(),
            client_timeout_secs = config.client_timeout.as_secs(),
            "provider configured"
        );

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn client(&self) -> &SplitClient {
        &self.client
    }

    /// Whether requests authenticate with a harness token.
    pub fn uses_harness_token(&self) -> bool {
        self.config.uses_harness_token()
    }

    /// Rollout definitions of splits in environments.
    pub fn split_definitions(&self) -> SplitDefinitionResource<'_> {
        SplitDefinitionResource::new(&self.client)
    }

    /// Keys assigned to segments in environments.
    pub fn segment_keys(&self) -> SegmentKeysResource<'_, SplitClient> {
        SegmentKeysResource::new(&self.client)
    }

    /// Fail when `resource` cannot be managed with a harness token.
    pub fn ensure_supported(&self, resource: &str) -> Result<()> {
        if self.uses_harness_token() && HARNESS_UNSUPPORTED_RESOURCES.contains(&resource) {
            return Err(ProviderError::UnsupportedWithHarnessToken {
                resource: resource.to_string(),
            });
        }
        Ok(())
    }

    /// Groups, unavailable with a harness token.
    pub fn groups(&self) -> Result<GroupsService<'_>> {
        self.ensure_supported("split_group")?;
        Ok(self.client.groups())
    }

    /// Delete an environment, or only forget it when the provider is
    /// configured to remove environments from state only.
    ///
    /// Returns whether a delete request was sent.
    pub async fn delete_environment(
        &self,
        workspace_id: &str,
        environment_id: &str,
    ) -> Result<bool> {
        if self.config.remove_environment_from_state_only {
            info!(workspace_id, environment_id, "environment removed from state only");
            return Ok(false);
        }
        self.client
            .environments()
            .delete(workspace_id, environment_id)
            .await
            .map_err(|e| ProviderError::api(format!("delete environment {}", environment_id), e))?;
        Ok(true)
    }

    /// Create an API key. Admin keys cannot be created with a harness token.
    pub async fn create_api_key(&self, request: &ApiKeyRequest) -> Result<ApiResponse<ApiKey>> {
        if self.uses_harness_token() && request.api_key_type == "admin" {
            return Err(ProviderError::UnsupportedWithHarnessToken {
                resource: "split_api_key (type admin)".to_string(),
            });
        }
        self.client
            .api_keys()
            .create(request)
            .await
            .map_err(|e| ProviderError::api(format!("create api key {}", request.name), e))
    }
}

/// Resources that only work with an admin API key.
const HARNESS_UNSUPPORTED_RESOURCES: &[&str] = &["split_group"];

/// Check that an identifier argument is a UUID.
pub fn validate_uuid(field: &'static str, value: &str) -> Result<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| ProviderError::invalid(field, value, format!("expected a UUID: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness_provider() -> Provider {
        Provider::configure(ProviderConfig::builder().harness_token("pat.abc").build()).unwrap()
    }

    #[test]
    fn test_configure_requires_credential() {
        let err = Provider::configure(ProviderConfig::default()).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_configure_rejects_trailing_slash() {
        let config = ProviderConfig::builder()
            .api_key("admin")
            .base_url("https://api.split.io/internal/api/v2/")
            .build();
        assert!(Provider::configure(config).is_err());
    }

    #[test]
    fn test_groups_unavailable_with_harness_token() {
        let provider = harness_provider();
        assert!(provider.uses_harness_token());
        assert!(matches!(
            provider.groups(),
            Err(ProviderError::UnsupportedWithHarnessToken { .. })
        ));
        assert!(provider.ensure_supported("split_workspace").is_ok());
    }

    #[test]
    fn test_groups_available_with_api_key() {
        let config = ProviderConfig::builder().api_key("admin").build();
        let provider = Provider::configure(config).unwrap();
        assert!(provider.groups().is_ok());
    }

    #[tokio::test]
    async fn test_admin_key_rejected_with_harness_token() {
        let provider = harness_provider();
        let err = provider
            .create_api_key(&ApiKeyRequest::new("ci", "admin"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("type admin"));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("workspace_id", "6a1b8f5e-2c1d-4e8a-9f0b-1c2d3e4f5a6b").is_ok());
        let err = validate_uuid("workspace_id", "not-a-uuid").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArgument { field: "workspace_id", .. }));
    }
}
