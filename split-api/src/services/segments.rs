//! Segments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EnvironmentRef, TrafficTypeRef};
use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, ListParams, ListResult};
use crate::Result;

/// A named set of keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<EnvironmentRef>,
    #[serde(default)]
    pub traffic_type: Option<TrafficTypeRef>,
    #[serde(default)]
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Segment operations.
pub struct SegmentsService<'a> {
    client: &'a SplitClient,
}

impl<'a> SegmentsService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        workspace_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<ListResult<Segment>>> {
        let path = format!("/segments/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().get(path).queries(params.to_query())).await
    }

    pub async fn get(&self, workspace_id: &str, name: &str) -> Result<ApiResponse<Segment>> {
        let path = format!("/segments/ws/{}/{}", escape(workspace_id), escape(name));
        self.client.fetch(self.client.http().get(path)).await
    }

    /// Create a segment. It is not active in any environment yet.
    pub async fn create(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        request: &SegmentRequest,
    ) -> Result<ApiResponse<Segment>> {
        debug!(workspace_id, traffic_type_id, name = %request.name, "creating segment");
        let path = format!(
            "/segments/ws/{}/trafficTypes/{}",
            escape(workspace_id),
            escape(traffic_type_id)
        );
        self.client.fetch(self.client.http().post(path).json(request)).await
    }

    /// Delete a segment, deactivating it in every environment.
    pub async fn delete(&self, workspace_id: &str, name: &str) -> Result<ApiResponse<()>> {
        debug!(workspace_id, segment = name, "deleting segment");
        let path = format!("/segments/ws/{}/{}", escape(workspace_id), escape(name));
        self.client.execute(self.client.http().delete(path)).await
    }

    /// Activate a segment in an environment so keys can be assigned to it.
    pub async fn activate(&self, environment_id: &str, name: &str) -> Result<ApiResponse<Segment>> {
        debug!(environment_id, segment = name, "activating segment");
        let path = format!("/segments/{}/{}", escape(environment_id), escape(name));
        self.client.fetch(self.client.http().post(path)).await
    }

    pub async fn deactivate(&self, environment_id: &str, name: &str) -> Result<ApiResponse<()>> {
        debug!(environment_id, segment = name, "deactivating segment");
        let path = format!("/segments/{}/{}", escape(environment_id), escape(name));
        self.client.execute(self.client.http().delete(path)).await
    }
}
