//! Per-entity services of the admin API.

mod api_keys;
mod attributes;
mod environments;
mod flag_sets;
mod groups;
mod segments;
mod splits;
mod traffic_types;
mod users;
mod workspaces;

pub use api_keys::{API_KEY_ROLES, API_KEY_TYPES, ApiKey, ApiKeyRequest, ApiKeysService};
pub use attributes::{Attribute, AttributeListParams, AttributeRequest, AttributesService};
pub use environments::{
    Environment, EnvironmentRequest, EnvironmentsService, SegmentKey, SegmentKeys,
    SegmentKeysRequest,
};
pub use flag_sets::{FlagSet, FlagSetRequest, FlagSetsService};
pub use groups::{Group, GroupRequest, GroupsService};
pub use segments::{Segment, SegmentRequest, SegmentsService, Tag};
pub use splits::{Split, SplitRequest, SplitsService};
pub use traffic_types::{TrafficType, TrafficTypeRequest, TrafficTypesService};
pub use users::{
    User, UserInviteRequest, UserListParams, UserStatus, UserUpdateRequest, UsersService,
};
pub use workspaces::{Workspace, WorkspaceRequest, WorkspacesService};

use serde::{Deserialize, Serialize};

/// A typed reference to another entity, e.g. `{"type": "workspace", "id": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    /// Reference an entity of `kind` by id.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            id: id.into(),
            name: None,
        }
    }
}

/// Environment embedded in another entity.
pub type EnvironmentRef = EntityRef;

/// Traffic type embedded in another entity.
pub type TrafficTypeRef = EntityRef;

/// Workspace embedded in another entity.
pub type WorkspaceRef = EntityRef;

/// One JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PatchOp {
    op: &'static str,
    path: &'static str,
    value: serde_json::Value,
}

impl PatchOp {
    pub(crate) fn replace(path: &'static str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "replace",
            path,
            value: value.into(),
        }
    }
}

/// Body carrying only a change comment.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommentBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<&'a str>,
}
