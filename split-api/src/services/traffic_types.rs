//! Traffic types.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WorkspaceRef;
use crate::client::{SplitClient, escape};
use crate::response::ApiResponse;
use crate::Result;

/// The kind of key a split or segment is evaluated against, e.g. `user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficType {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub display_attribute_id: Option<String>,
    #[serde(default)]
    pub workspace: Option<WorkspaceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTypeRequest {
    pub name: String,
}

/// Traffic type operations.
pub struct TrafficTypesService<'a> {
    client: &'a SplitClient,
}

impl<'a> TrafficTypesService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, workspace_id: &str) -> Result<ApiResponse<Vec<TrafficType>>> {
        let path = format!("/trafficTypes/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().get(path)).await
    }

    pub async fn find_by_id(
        &self,
        workspace_id: &str,
        id: &str,
    ) -> Result<ApiResponse<TrafficType>> {
        self.list(workspace_id)
            .await?
            .find_by("traffic type", id, |t| t.id == id)
    }

    pub async fn find_by_name(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<ApiResponse<TrafficType>> {
        self.list(workspace_id)
            .await?
            .find_by("traffic type", name, |t| t.name == name)
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        request: &TrafficTypeRequest,
    ) -> Result<ApiResponse<TrafficType>> {
        debug!(workspace_id, name = %request.name, "creating traffic type");
        let path = format!("/trafficTypes/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().post(path).json(request)).await
    }

    /// Delete a traffic type. Fails remotely while splits or segments use it.
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        debug!(traffic_type_id = id, "deleting traffic type");
        let path = format!("/trafficTypes/{}", escape(id));
        self.client.execute(self.client.http().delete(path)).await
    }
}
