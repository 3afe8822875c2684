//! Traffic type attributes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{SplitClient, escape};
use crate::response::ApiResponse;
use crate::Result;

/// An attribute of a traffic type's schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Attribute identifier as sent by SDKs.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub traffic_type_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// One of `string`, `datetime`, `number` or `set`; raw string display when absent.
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub is_searchable: Option<bool>,
    #[serde(default)]
    pub suggested_values: Vec<String>,
}

/// Body of an attribute create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRequest {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_searchable: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_values: Vec<String>,
}

/// Query parameters of an attribute listing.
///
/// Prefix search and markers only apply with `paginate` set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeListParams {
    pub paginate: bool,
    pub search_prefix: Option<String>,
    pub after_marker: Option<String>,
    pub before_marker: Option<String>,
    pub marker_limit: Option<u32>,
}

impl AttributeListParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if self.paginate {
            query.push(("Paginate", "true".to_string()));
        }
        if let Some(prefix) = &self.search_prefix {
            query.push(("searchPrefix", prefix.clone()));
        }
        if let Some(marker) = &self.after_marker {
            query.push(("afterMarker", marker.clone()));
        }
        if let Some(marker) = &self.before_marker {
            query.push(("beforeMarker", marker.clone()));
        }
        if let Some(limit) = self.marker_limit {
            query.push(("markerLimit", limit.to_string()));
        }
        query
    }
}

/// Attribute operations.
pub struct AttributesService<'a> {
    client: &'a SplitClient,
}

impl<'a> AttributesService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    fn path(workspace_id: &str, traffic_type_id: &str) -> String {
        format!("/schema/ws/{}/trafficTypes/{}", escape(workspace_id), escape(traffic_type_id))
    }

    pub async fn list(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        params: &AttributeListParams,
    ) -> Result<ApiResponse<Vec<Attribute>>> {
        let request = self
            .client
            .http()
            .get(Self::path(workspace_id, traffic_type_id))
            .queries(params.to_query());
        self.client.fetch(request).await
    }

    /// Find an attribute by id. There is no single-attribute endpoint.
    pub async fn find_by_id(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        attribute_id: &str,
        params: &AttributeListParams,
    ) -> Result<ApiResponse<Attribute>> {
        self.list(workspace_id, traffic_type_id, params)
            .await?
            .find_by("attribute", attribute_id, |a| a.id == attribute_id)
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        request: &AttributeRequest,
    ) -> Result<ApiResponse<Attribute>> {
        debug!(workspace_id, traffic_type_id, id = ?request.identifier, "creating attribute");
        let builder = self
            .client
            .http()
            .post(Self::path(workspace_id, traffic_type_id))
            .json(request);
        self.client.fetch(builder).await
    }

    pub async fn update(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        attribute_id: &str,
        request: &AttributeRequest,
    ) -> Result<ApiResponse<Attribute>> {
        let path = format!(
            "{}/{}",
            Self::path(workspace_id, traffic_type_id),
            escape(attribute_id)
        );
        self.client.fetch(self.client.http().patch(path).json(request)).await
    }

    pub async fn delete(
        &self,
        workspace_id: &str,
        traffic_type_id: &str,
        attribute_id: &str,
    ) -> Result<ApiResponse<()>> {
        debug!(workspace_id, traffic_type_id, attribute_id, "deleting attribute");
        let path = format!(
            "{}/{}",
            Self::path(workspace_id, traffic_type_id),
            escape(attribute_id)
        );
        self.client.execute(self.client.http().delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_query() {
        assert!(AttributeListParams::default().to_query().is_empty());

        let params = AttributeListParams {
            paginate: true,
            search_prefix: Some("pl".to_string()),
            marker_limit: Some(20),
            ..Default::default()
        };
        assert_eq!(
            params.to_query(),
            vec![
                ("Paginate", "true".to_string()),
                ("searchPrefix", "pl".to_string()),
                ("markerLimit", "20".to_string()),
            ]
        );
    }
}
