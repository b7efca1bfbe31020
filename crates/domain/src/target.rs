use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{DirectoryNode, GroupId, Right};

/// Kind of node a target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    /// Directory group.
    Group,
    /// Directory user.
    User,
}

/// Permission-scoped projection of a directory node for tree pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Group id or user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent target id, `None` at the top of the picker tree.
    pub parent: Option<String>,
    /// Target kind.
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// Rights the caller holds on this target.
    pub rights: BTreeSet<Right>,
}

impl Target {
    /// Projects a group under the given picker parent.
    #[must_use]
    pub fn from_group(
        node: &DirectoryNode,
        parent: Option<GroupId>,
        rights: BTreeSet<Right>,
    ) -> Self {
        Self {
            id: node.id().to_string(),
            name: node.name().to_owned(),
            parent: parent.map(|parent| parent.to_string()),
            target_type: TargetType::Group,
            rights,
        }
    }

    /// Projects a directory user placed under a group.
    #[must_use]
    pub fn user(id: impl Into<String>, name: impl Into<String>, group: GroupId) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: Some(group.to_string()),
            target_type: TargetType::User,
            rights: BTreeSet::new(),
        }
    }
}
