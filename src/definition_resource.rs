//! Lifecycle of a split's rollout definition in one environment.

use split_api::{SplitClient, SplitDefinition};
use tracing::{info, warn};

use crate::definition::{SplitDefinitionConfig, decode, encode};
use crate::import::parse_composite_id;
use crate::provider::validate_uuid;
use crate::{ProviderError, Result};

const IMPORT_ID_FORMAT: &str = "<workspace_id>:<split_name>:<environment_id>";

/// State of a managed definition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDefinitionState {
    /// Definition id assigned by the API.
    pub id: String,
    pub killed: bool,
    pub config: SplitDefinitionConfig,
}

impl SplitDefinitionState {
    fn from_definition(workspace_id: &str, definition: &SplitDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            killed: definition.killed,
            config: decode(workspace_id, definition),
        }
    }
}

/// Creates, reads, replaces and removes split definitions.
///
/// Every write sends the complete definition and is followed by a read,
/// so the returned state is what the server holds.
pub struct SplitDefinitionResource<'a> {
    client: &'a SplitClient,
}

impl<'a> SplitDefinitionResource<'a> {
    pub fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    fn validate_ids(config: &SplitDefinitionConfig) -> Result<()> {
        validate_uuid("workspace_id", &config.workspace_id)?;
        validate_uuid("environment_id", &config.environment_id)
    }

    fn encode(config: &SplitDefinitionConfig) -> Result<split_api::SplitDefinitionRequest> {
        encode(config).map_err(|source| ProviderError::Definition {
            split: config.split_name.clone(),
            environment_id: config.environment_id.clone(),
            source,
        })
    }

    pub async fn create(&self, config: &SplitDefinitionConfig) -> Result<SplitDefinitionState> {
        Self::validate_ids(config)?;
        let request = Self::encode(config)?;

        let created = self
            .client
            .splits()
            .create_definition(
                &config.workspace_id,
                &config.split_name,
                &config.environment_id,
                &request,
            )
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!(
                        "create split definition {} in environment {}",
                        config.split_name, config.environment_id
                    ),
                    e,
                )
            })?;
        info!(id = %created.data.id, split = %config.split_name, "created split definition");

        self.read(&config.workspace_id, &config.split_name, &config.environment_id)
            .await
    }

    pub async fn read(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
    ) -> Result<SplitDefinitionState> {
        let definition = self
            .client
            .splits()
            .get_definition(workspace_id, split_name, environment_id)
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!(
                        "fetch split definition {} in environment {}",
                        split_name, environment_id
                    ),
                    e,
                )
            })?;

        let mut state = SplitDefinitionState::from_definition(workspace_id, &definition.data);
        if state.config.environment_id.is_empty() {
            state.config.environment_id = environment_id.to_string();
        }
        if state.config.split_name.is_empty() {
            state.config.split_name = split_name.to_string();
        }
        Ok(state)
    }

    /// Replace the definition with `config` in full.
    pub async fn update(&self, config: &SplitDefinitionConfig) -> Result<SplitDefinitionState> {
        Self::validate_ids(config)?;
        let request = Self::encode(config)?;

        self.client
            .splits()
            .update_definition_full(
                &config.workspace_id,
                &config.split_name,
                &config.environment_id,
                &request,
            )
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!(
                        "update split definition {} in environment {}",
                        config.split_name, config.environment_id
                    ),
                    e,
                )
            })?;

        self.read(&config.workspace_id, &config.split_name, &config.environment_id)
            .await
    }

    /// Unconfigure the split in the environment. The split itself is kept.
    pub async fn delete(&self, config: &SplitDefinitionConfig) -> Result<()> {
        self.client
            .splits()
            .remove_definition(&config.workspace_id, &config.split_name, &config.environment_id)
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!(
                        "remove split definition {} from environment {}",
                        config.split_name, config.environment_id
                    ),
                    e,
                )
            })?;
        Ok(())
    }

    /// Adopt an existing definition by `<workspace_id>:<split_name>:<environment_id>`.
    pub async fn import(&self, id: &str) -> Result<SplitDefinitionState> {
        let [workspace_id, split_name, environment_id] =
            parse_composite_id::<3>(id, IMPORT_ID_FORMAT)?;
        self.read(workspace_id, split_name, environment_id).await
    }

    /// Serve the default treatment to everyone in the environment.
    pub async fn kill(
        &self,
        config: &SplitDefinitionConfig,
        comment: Option<&str>,
    ) -> Result<SplitDefinitionState> {
        warn!(split = %config.split_name, environment_id = %config.environment_id, "killing split");
        let killed = self
            .client
            .splits()
            .kill(&config.workspace_id, &config.split_name, &config.environment_id, comment)
            .await
            .map_err(|e| ProviderError::api(format!("kill split {}", config.split_name), e))?;
        Ok(SplitDefinitionState::from_definition(&config.workspace_id, &killed.data))
    }

    /// Resume normal evaluation after a kill.
    pub async fn restore(
        &self,
        config: &SplitDefinitionConfig,
        comment: Option<&str>,
    ) -> Result<SplitDefinitionState> {
        let restored = self
            .client
            .splits()
            .restore(&config.workspace_id, &config.split_name, &config.environment_id, comment)
            .await
            .map_err(|e| ProviderError::api(format!("restore split {}", config.split_name), e))?;
        Ok(SplitDefinitionState::from_definition(&config.workspace_id, &restored.data))
    }
}
