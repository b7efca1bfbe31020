use std::collections::BTreeMap;

use auditum_application::{DirectoryGroup, DirectoryRole, DirectoryUser};
use auditum_domain::GroupId;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GroupRepresentation {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    realm_roles: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    sub_groups: Vec<GroupRepresentation>,
}

impl GroupRepresentation {
    /// Converts the group and its subtree, dropping groups whose id is not a UUID.
    pub(super) fn into_group(self) -> Option<DirectoryGroup> {
        let Some(id) = GroupId::parse(self.id.as_str()) else {
            warn!(
                group_id = %self.id,
                path = %self.path,
                "skipping directory group with non-uuid id"
            );
            return None;
        };

        Some(DirectoryGroup {
            id,
            name: self.name,
            path: self.path,
            realm_roles: self.realm_roles.into_iter().collect(),
            attributes: self.attributes,
            sub_groups: into_groups(self.sub_groups),
        })
    }
}

pub(super) fn into_groups(groups: Vec<GroupRepresentation>) -> Vec<DirectoryGroup> {
    groups
        .into_iter()
        .filter_map(GroupRepresentation::into_group)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserRepresentation {
    id: String,
    #[serde(default)]
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    enabled: bool,
}

impl From<UserRepresentation> for DirectoryUser {
    fn from(value: UserRepresentation) -> Self {
        Self {
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            enabled: value.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RoleRepresentation {
    id: String,
    name: String,
    description: Option<String>,
    #[serde(default)]
    composite: bool,
}

impl From<RoleRepresentation> for DirectoryRole {
    fn from(value: RoleRepresentation) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            composite: value.composite,
        }
    }
}
