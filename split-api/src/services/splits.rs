//! Splits and their per-environment definitions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CommentBody, TrafficTypeRef};
use crate::client::{SplitClient, escape};
use crate::definition::{SplitDefinition, SplitDefinitionRequest};
use crate::response::{ApiResponse, ListParams, ListResult, collect_offset_pages};
use crate::Result;

/// A feature flag, independent of any environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<super::Tag>,
    #[serde(default)]
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub rollout_status_timestamp: Option<i64>,
    #[serde(default)]
    pub traffic_type: Option<TrafficTypeRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Split and definition operations.
///
/// Split names are used as path segments and are escaped.
pub struct SplitsService<'a> {
    client: &'a SplitClient,
}

impl<'a> SplitsService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        workspace_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<ListResult<Split>>> {
        let path = format!("/splits/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().get(path).queries(params.to_query())).await
    }

    pub async fn list_all(&self, workspace_id: &str) -> Result<ApiResponse<Vec<Split>>> {
        collect_offset_pages(move |params| async move { self.list(workspace_id, &params).await })
            .await
    }

    /// Get a split by name or id.
    pub async fn get(&self, workspace_id: &str, split: &str) -> Result<ApiResponse<Split>> {
        let path = format!("/splits/ws/{}/{}", escape(workspace_id), escape(split));
        self.client.fetch(self.client.http().get(path)).await
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        request: &SplitRequest,
    ) -> Result<ApiResponse<Split>> {
        debug!(workspace_id, traffic_type_id, split = %request.name, "creating split");
        let path = format!(
            "/splits/ws/{}/trafficTypes/{}",
            escape(workspace_id),
            escape(traffic_type_id)
        );
        self.client.fetch(self.client.http().post(path).json(request)).await
    }

    /// Replace a split's description. The body is the bare JSON string.
    pub async fn update_description(
        &self,
        workspace_id: &str,
        split_name: &str,
        description: &str,
    ) -> Result<ApiResponse<Split>> {
        let path = format!(
            "/splits/ws/{}/{}/updateDescription",
            escape(workspace_id),
            escape(split_name)
        );
        self.client.fetch(self.client.http().put(path).json(description)).await
    }

    /// Delete a split, removing its definition from every environment.
    pub async fn delete(&self, workspace_id: &str, split_name: &str) -> Result<ApiResponse<()>> {
        debug!(workspace_id, split = split_name, "deleting split");
        let path = format!("/splits/ws/{}/{}", escape(workspace_id), escape(split_name));
        self.client.execute(self.client.http().delete(path)).await
    }

    fn definition_path(workspace_id: &str, split_name: &str, environment_id: &str) -> String {
        format!(
            "/splits/ws/{}/{}/environments/{}",
            escape(workspace_id),
            escape(split_name),
            escape(environment_id)
        )
    }

    /// One page of the definitions configured in an environment.
    pub async fn list_definitions(
        &self,
        workspace_id: &str,
        environment_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<ListResult<SplitDefinition>>> {
        let path = format!(
            "/splits/ws/{}/environments/{}",
            escape(workspace_id),
            escape(environment_id)
        );
        self.client.fetch(self.client.http().get(path).queries(params.to_query())).await
    }

    pub async fn list_all_definitions(
        &self,
        workspace_id: &str,
        environment_id: &str,
    ) -> Result<ApiResponse<Vec<SplitDefinition>>> {
        collect_offset_pages(move |params| async move {
            self.list_definitions(workspace_id, environment_id, &params).await
        })
        .await
    }

    pub async fn get_definition(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
    ) -> Result<ApiResponse<SplitDefinition>> {
        let path = Self::definition_path(workspace_id, split_name, environment_id);
        self.client.fetch(self.client.http().get(path)).await
    }

    /// Configure a split in an environment.
    pub async fn create_definition(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
        request: &SplitDefinitionRequest,
    ) -> Result<ApiResponse<SplitDefinition>> {
        info!(
            workspace_id,
            split = split_name,
            environment_id,
            rules = request.rules.len(),
            "creating split definition"
        );
        let path = Self::definition_path(workspace_id, split_name, environment_id);
        self.client.fetch(self.client.http().post(path).json(request)).await
    }

    /// Replace the whole definition of a split in an environment.
    pub async fn update_definition_full(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
        request: &SplitDefinitionRequest,
    ) -> Result<ApiResponse<SplitDefinition>> {
        info!(
            workspace_id,
            split = split_name,
            environment_id,
            rules = request.rules.len(),
            "replacing split definition"
        );
        let path = Self::definition_path(workspace_id, split_name, environment_id);
        self.client.fetch(self.client.http().put(path).json(request)).await
    }

    /// Unconfigure a split in an environment. The split itself is kept.
    pub async fn remove_definition(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
    ) -> Result<ApiResponse<()>> {
        info!(workspace_id, split = split_name, environment_id, "removing split definition");
        let path = Self::definition_path(workspace_id, split_name, environment_id);
        self.client.execute(self.client.http().delete(path)).await
    }

    /// Serve the default treatment to all traffic in an environment.
    pub async fn kill(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
        comment: Option<&str>,
    ) -> Result<ApiResponse<SplitDefinition>> {
        warn!(workspace_id, split = split_name, environment_id, "killing split");
        let path = Self::definition_path(workspace_id, split_name, environment_id) + "/kill";
        self.client
            .fetch(self.client.http().put(path).json(&CommentBody { comment }))
            .await
    }

    /// Undo a kill.
    pub async fn restore(
        &self,
        workspace_id: &str,
        split_name: &str,
        environment_id: &str,
        comment: Option<&str>,
    ) -> Result<ApiResponse<SplitDefinition>> {
        info!(workspace_id, split = split_name, environment_id, "restoring split");
        let path = Self::definition_path(workspace_id, split_name, environment_id) + "/restore";
        self.client
            .fetch(self.client.http().put(path).json(&CommentBody { comment }))
            .await
    }
}
