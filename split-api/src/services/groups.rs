//! Groups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, MarkerPage};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Group operations.
pub struct GroupsService<'a> {
    client: &'a SplitClient,
}

impl<'a> GroupsService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<ApiResponse<MarkerPage<Group>>> {
        self.client.fetch(self.client.http().get("/groups")).await
    }

    pub async fn get(&self, id: &str) -> Result<ApiResponse<Group>> {
        let path = format!("/groups/{}", escape(id));
        self.client.fetch(self.client.http().get(path)).await
    }

    pub async fn create(&self, request: &GroupRequest) -> Result<ApiResponse<Group>> {
        debug!(name = %request.name, "creating group");
        self.client.fetch(self.client.http().post("/groups").json(request)).await
    }

    pub async fn update(&self, id: &str, request: &GroupRequest) -> Result<ApiResponse<Group>> {
        let path = format!("/groups/{}", escape(id));
        self.client.fetch(self.client.http().put(path).json(request)).await
    }

    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        debug!(group_id = id, "deleting group");
        let path = format!("/groups/{}", escape(id));
        self.client.execute(self.client.http().delete(path)).await
    }
}
