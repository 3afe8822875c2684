//! Environments and the keys manually assigned to segments in them.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::PatchOp;
use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, ListParams, ListResult, collect_offset_pages_sized};
use crate::services::Segment;
use crate::{ApiError, Result};

/// A stage of the delivery process, such as production or staging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub production: bool,
}

/// Body of an environment create or update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<bool>,
}

/// One key of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentKey {
    pub key: String,
}

/// Keys of a segment in one environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentKeys {
    #[serde(default)]
    pub keys: Vec<SegmentKey>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Page size used when walking every key of a segment.
const SEGMENT_KEYS_PAGE_SIZE: u32 = 100;

impl SegmentKeys {
    /// The bare key strings.
    pub fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.key.clone()).collect()
    }

    /// `count` is the total number of keys in the segment, not the page length.
    fn into_list_result(self) -> ListResult<SegmentKey> {
        ListResult {
            objects: self.keys,
            offset: self.offset,
            limit: self.limit,
            total_count: self.count,
        }
    }
}

/// Body of a segment keys upload or removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentKeysRequest {
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Environment operations.
pub struct EnvironmentsService<'a> {
    client: &'a SplitClient,
}

impl<'a> EnvironmentsService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    /// Every environment of a workspace.
    pub async fn list(&self, workspace_id: &str) -> Result<ApiResponse<Vec<Environment>>> {
        let path = format!("/environments/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().get(path)).await
    }

    /// Find an environment by id by scanning the listing.
    pub async fn find_by_id(
        &self,
        workspace_id: &str,
        environment_id: &str,
    ) -> Result<ApiResponse<Environment>> {
        self.list(workspace_id)
            .await?
            .find_by("environment", environment_id, |e| e.id == environment_id)
    }

    /// Find an environment by name by scanning the listing.
    pub async fn find_by_name(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> Result<ApiResponse<Environment>> {
        self.list(workspace_id)
            .await?
            .find_by("environment", name, |e| e.name == name)
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        request: &EnvironmentRequest,
    ) -> Result<ApiResponse<Environment>> {
        debug!(workspace_id, name = ?request.name, "creating environment");
        let path = format!("/environments/ws/{}", escape(workspace_id));
        self.client.fetch(self.client.http().post(path).json(request)).await
    }

    /// Update an environment with one `replace` operation per set field.
    ///
    /// The API expects every patch value as a string, booleans included.
    pub async fn update(
        &self,
        workspace_id: &str,
        environment_id: &str,
        request: &EnvironmentRequest,
    ) -> Result<ApiResponse<Environment>> {
        let mut ops = Vec::new();
        if let Some(name) = &request.name {
            ops.push(PatchOp::replace("/name", name.clone()));
        }
        if let Some(production) = request.production {
            ops.push(PatchOp::replace("/production", production.to_string()));
        }

        let path = format!("/environments/ws/{}/{}", escape(workspace_id), escape(environment_id));
        self.client.fetch(self.client.http().patch(path).json(&ops)).await
    }

    /// Delete an environment.
    ///
    /// Fails remotely while API keys still reference the environment.
    pub async fn delete(
        &self,
        workspace_id: &str,
        environment_id: &str,
    ) -> Result<ApiResponse<()>> {
        debug!(workspace_id, environment_id, "deleting environment");
        let path = format!("/environments/ws/{}/{}", escape(workspace_id), escape(environment_id));
        self.client.execute(self.client.http().delete(path)).await
    }

    /// Segments activated in an environment.
    pub async fn list_segments(
        &self,
        workspace_id: &str,
        environment_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<ListResult<Segment>>> {
        let path = format!(
            "/segments/ws/{}/environments/{}",
            escape(workspace_id),
            escape(environment_id)
        );
        self.client.fetch(self.client.http().get(path).queries(params.to_query())).await
    }

    /// One page of the keys manually assigned to a segment in an environment.
    pub async fn get_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<SegmentKeys>> {
        let path = format!("/segments/{}/{}/keys", escape(environment_id), escape(segment_name));
        self.client
            .fetch(self.client.http().get(path).queries(params.to_query()))
            .await
    }

    /// Every key of a segment, walking the pages until `count` keys are held.
    pub async fn get_all_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
    ) -> Result<ApiResponse<Vec<SegmentKey>>> {
        collect_offset_pages_sized(SEGMENT_KEYS_PAGE_SIZE, move |params| async move {
            let page = self.get_segment_keys(environment_id, segment_name, &params).await?;
            Ok::<_, ApiError>(page.map(SegmentKeys::into_list_result))
        })
        .await
    }

    /// Upload keys to a segment. With `replace` the uploaded keys become the full set.
    pub async fn add_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        replace: bool,
        request: &SegmentKeysRequest,
    ) -> Result<ApiResponse<()>> {
        info!(
            environment_id,
            segment = segment_name,
            replace,
            count = request.keys.len(),
            "uploading segment keys"
        );
        let path = format!(
            "/segments/{}/{}/uploadKeys",
            escape(environment_id),
            escape(segment_name)
        );
        let request_builder = self
            .client
            .http()
            .put(path)
            .query("replace", replace.to_string())
            .json(request);
        self.client.execute(request_builder).await
    }

    /// Remove keys from a segment.
    pub async fn remove_segment_keys(
        &self,
        environment_id: &str,
        segment_name: &str,
        request: &SegmentKeysRequest,
    ) -> Result<ApiResponse<()>> {
        info!(
            environment_id,
            segment = segment_name,
            count = request.keys.len(),
            "removing segment keys"
        );
        let path = format!(
            "/segments/{}/{}/removeKeys",
            escape(environment_id),
            escape(segment_name)
        );
        self.client.execute(self.client.http().put(path).json(request)).await
    }
}
