//! Workspaces.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PatchOp;
use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, ListParams, ListResult, collect_offset_pages};
use crate::Result;

/// A workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub requires_title_and_comments: bool,
}

/// Body of a workspace create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub requires_title_and_comments: bool,
}

/// Workspace operations.
///
/// There is no single-workspace endpoint, so lookups scan the listing.
pub struct WorkspacesService<'a> {
    client: &'a SplitClient,
}

impl<'a> WorkspacesService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    /// One page of workspaces.
    pub async fn list(&self, params: &ListParams) -> Result<ApiResponse<ListResult<Workspace>>> {
        let request = self.client.http().get("/workspaces").queries(params.to_query());
        self.client.fetch(request).await
    }

    /// Every workspace, across all pages.
    pub async fn list_all(&self) -> Result<ApiResponse<Vec<Workspace>>> {
        collect_offset_pages(move |params| async move { self.list(&params).await }).await
    }

    /// Find a workspace by id.
    pub async fn find_by_id(&self, id: &str) -> Result<ApiResponse<Workspace>> {
        self.list_all().await?.find_by("workspace", id, |w| w.id == id)
    }

    /// Find a workspace by name.
    pub async fn find_by_name(&self, name: &str) -> Result<ApiResponse<Workspace>> {
        self.list_all().await?.find_by("workspace", name, |w| w.name == name)
    }

    pub async fn create(&self, request: &WorkspaceRequest) -> Result<ApiResponse<Workspace>> {
        debug!(name = %request.name, "creating workspace");
        self.client.fetch(self.client.http().post("/workspaces").json(request)).await
    }

    /// Replace the name and title/comment requirement of a workspace.
    pub async fn update(
        &self,
        id: &str,
        request: &WorkspaceRequest,
    ) -> Result<ApiResponse<Workspace>> {
        let ops = [
            PatchOp::replace("/name", request.name.clone()),
            PatchOp::replace("/requiresTitleAndComments", request.requires_title_and_comments),
        ];
        let path = format!("/workspaces/{}", escape(id));
        self.client.fetch(self.client.http().patch(path).json(&ops)).await
    }

    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        debug!(workspace_id = id, "deleting workspace");
        let path = format!("/workspaces/{}", escape(id));
        self.client.execute(self.client.http().delete(path)).await
    }
}
