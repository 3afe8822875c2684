//! Flag sets.
//!
//! Flag sets live on the v3 API, so every request uses the absolute
//! flag sets URL instead of the client base URL.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WorkspaceRef;
use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, MarkerPage, collect_marker_pages};
use crate::Result;

/// A named group of splits fetched together by SDKs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workspace: Option<WorkspaceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSetRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub workspace: WorkspaceRef,
}

impl FlagSetRequest {
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            workspace: WorkspaceRef::new("workspace", workspace_id),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Flag set operations.
pub struct FlagSetsService<'a> {
    client: &'a SplitClient,
}

impl<'a> FlagSetsService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &FlagSetRequest) -> Result<ApiResponse<FlagSet>> {
        debug!(workspace_id = %request.workspace.id, name = %request.name, "creating flag set");
        let url = self.client.flag_sets_url("/flag-sets");
        self.client.fetch(self.client.http().post(url).json(request)).await
    }

    pub async fn get(&self, id: &str) -> Result<ApiResponse<FlagSet>> {
        let url = self.client.flag_sets_url(&format!("/flag-sets/{}", escape(id)));
        self.client.fetch(self.client.http().get(url)).await
    }

    /// One page of a workspace's flag sets, starting after `after` when given.
    pub async fn list(
        &self,
        workspace_id: &str,
        after: Option<&str>,
    ) -> Result<ApiResponse<MarkerPage<FlagSet>>> {
        let mut request = self
            .client
            .http()
            .get(self.client.flag_sets_url("/flag-sets"))
            .query("workspace_id", workspace_id);
        if let Some(marker) = after {
            request = request.query("after", marker);
        }
        self.client.fetch(request).await
    }

    /// Every flag set of a workspace, following markers to the last page.
    pub async fn list_all(&self, workspace_id: &str) -> Result<ApiResponse<Vec<FlagSet>>> {
        collect_marker_pages(move |marker| async move {
            self.list(workspace_id, marker.as_deref()).await
        })
        .await
    }

    pub async fn find_by_name(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<ApiResponse<FlagSet>> {
        self.list_all(workspace_id)
            .await?
            .find_by("flag set", name, |f| f.name == name)
    }

    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        debug!(flag_set_id = id, "deleting flag set");
        let url = self.client.flag_sets_url(&format!("/flag-sets/{}", escape(id)));
        self.client.execute(self.client.http().delete(url)).await
    }
}
