//! Organization users.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::{EntityRef, Group};
use crate::client::{SplitClient, escape};
use crate::response::{ApiResponse, MarkerPage, collect_marker_pages};
use crate::Result;

/// Membership state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Pending,
    Active,
    Deactivated,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Active => "ACTIVE",
            UserStatus::Deactivated => "DEACTIVATED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(rename = "2fa", default)]
    pub two_factor: Option<bool>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Filters and markers of a user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListParams {
    pub status: Option<UserStatus>,
    /// Page size, 1 to 200.
    pub limit: Option<u32>,
    pub before: Option<String>,
    pub after: Option<String>,
    /// Only active members of this group.
    pub group_id: Option<String>,
}

impl UserListParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(before) = &self.before {
            query.push(("before", before.clone()));
        }
        if let Some(after) = &self.after {
            query.push(("after", after.clone()));
        }
        if let Some(group_id) = &self.group_id {
            query.push(("group_id", group_id.clone()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInviteRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<EntityRef>,
}

/// Body of a user update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "2fa", default, skip_serializing_if = "Option::is_none")]
    pub two_factor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// User operations.
pub struct UsersService<'a> {
    client: &'a SplitClient,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(client: &'a SplitClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: &UserListParams) -> Result<ApiResponse<MarkerPage<User>>> {
        self.client
            .fetch(self.client.http().get("/users").queries(params.to_query()))
            .await
    }

    /// Every user matching the filters, following markers to the last page.
    pub async fn list_all(&self, params: &UserListParams) -> Result<ApiResponse<Vec<User>>> {
        collect_marker_pages(move |after| {
            let params = UserListParams {
                after,
                before: None,
                ..params.clone()
            };
            async move { self.list(&params).await }
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<ApiResponse<User>> {
        let path = format!("/users/{}", escape(id));
        self.client.fetch(self.client.http().get(path)).await
    }

    /// Invite a user by email. The user stays pending until the invite is accepted.
    pub async fn invite(&self, request: &UserInviteRequest) -> Result<ApiResponse<User>> {
        debug!(groups = request.groups.len(), "inviting user");
        self.client.fetch(self.client.http().post("/users").json(request)).await
    }

    pub async fn update(&self, id: &str, request: &UserUpdateRequest) -> Result<ApiResponse<User>> {
        let path = format!("/users/{}", escape(id));
        self.client.fetch(self.client.http().put(path).json(request)).await
    }

    /// Delete a user whose invite is still pending. Active users can only be deactivated.
    pub async fn delete_pending(&self, id: &str) -> Result<ApiResponse<()>> {
        debug!(user_id = id, "deleting pending user");
        let path = format!("/users/{}", escape(id));
        self.client.execute(self.client.http().delete(path)).await
    }
}
