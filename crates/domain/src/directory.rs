mod flat_map;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use auditum_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use flat_map::FlatGroupMap;

/// Path of the synthetic root node every directory tree hangs from.
pub const ROOT_PATH: &str = "/";

/// Stable directory-assigned identifier of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Identifier of the synthetic root node.
    #[must_use]
    pub fn root() -> Self {
        Self(Uuid::nil())
    }

    /// Creates a group identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a directory identifier, returning `None` for anything that is not a UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns whether this is the synthetic root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }
}

impl Display for GroupId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| AppError::Validation(format!("invalid group id '{value}'")))
    }
}

/// Kind of directory node. The directory only exposes groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Organizational group.
    Group,
}

/// One node of the flattened directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    id: GroupId,
    name: String,
    path: String,
    parent_id: Option<GroupId>,
    own_roles: BTreeSet<String>,
    inherited_roles: BTreeSet<String>,
    effective_roles: BTreeSet<String>,
    hidden: bool,
    node_type: NodeType,
}

impl DirectoryNode {
    /// Creates a node, deriving its effective roles from own and inherited roles.
    pub fn new(
        id: GroupId,
        name: impl Into<String>,
        path: impl Into<String>,
        parent_id: Option<GroupId>,
        own_roles: BTreeSet<String>,
        inherited_roles: BTreeSet<String>,
        hidden: bool,
    ) -> AppResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(AppError::Validation(format!(
                "directory path '{path}' must start with '/'"
            )));
        }

        let effective_roles = own_roles.union(&inherited_roles).cloned().collect();

        Ok(Self {
            id,
            name: name.into(),
            path,
            parent_id,
            own_roles,
            inherited_roles,
            effective_roles,
            hidden,
            node_type: NodeType::Group,
        })
    }

    /// Creates the synthetic root node for a realm.
    #[must_use]
    pub fn root(realm: impl Into<String>) -> Self {
        Self {
            id: GroupId::root(),
            name: realm.into(),
            path: ROOT_PATH.to_owned(),
            parent_id: None,
            own_roles: BTreeSet::new(),
            inherited_roles: BTreeSet::new(),
            effective_roles: BTreeSet::new(),
            hidden: false,
            node_type: NodeType::Group,
        }
    }

    /// Returns the node identifier.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the unique slash-separated path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the parent id. Only the synthetic root has none.
    #[must_use]
    pub fn parent_id(&self) -> Option<GroupId> {
        self.parent_id
    }

    /// Returns roles assigned directly to this node.
    #[must_use]
    pub fn own_roles(&self) -> &BTreeSet<String> {
        &self.own_roles
    }

    /// Returns roles accumulated from ancestors.
    #[must_use]
    pub fn inherited_roles(&self) -> &BTreeSet<String> {
        &self.inherited_roles
    }

    /// Returns own and inherited roles, plus any roles forced by a membership query.
    #[must_use]
    pub fn effective_roles(&self) -> &BTreeSet<String> {
        &self.effective_roles
    }

    /// Returns whether the node is excluded from externally visible results.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns the node type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns whether any effective role is in `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &BTreeSet<String>) -> bool {
        !self.effective_roles.is_disjoint(roles)
    }

    /// Tags the node with the role context of a query.
    pub fn annotate_roles(&mut self, roles: &BTreeSet<String>) {
        self.effective_roles.extend(roles.iter().cloned());
    }
}

/// Traversal mode applied to a user's direct memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipDirection {
    /// Direct memberships only.
    None,
    /// Direct memberships and their ancestors.
    Up,
    /// Direct memberships and their descendants.
    Down,
}

impl MembershipDirection {
    /// Returns a stable transport value for this direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Returns whether a candidate path is reached from a membership path.
    ///
    /// Comparison is a literal string prefix test, so `/Team1` reaches
    /// `/Team10` going down.
    #[must_use]
    pub fn reaches(&self, candidate_path: &str, membership_path: &str) -> bool {
        if candidate_path == membership_path {
            return true;
        }

        match self {
            Self::None => false,
            Self::Down => candidate_path.starts_with(membership_path),
            Self::Up => membership_path.starts_with(candidate_path),
        }
    }
}

impl FromStr for MembershipDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(AppError::Validation(format!(
                "unknown membership direction '{value}'"
            ))),
        }
    }
}

/// Directory user with its direct group memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    /// Directory user id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Groups the user is directly assigned to.
    pub group_ids: Vec<GroupId>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{DirectoryNode, GroupId, MembershipDirection};

    fn roles(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn effective_roles_union_own_and_inherited() {
        let node = DirectoryNode::new(
            GroupId::root(),
            "Manager",
            "/Functions/Manager",
            None,
            roles(&["Y"]),
            roles(&["X"]),
            false,
        );
        assert!(node.is_ok());
        let node = node.unwrap_or_else(|_| DirectoryNode::root("realm"));
        assert_eq!(node.effective_roles(), &roles(&["X", "Y"]));
        assert_eq!(node.inherited_roles(), &roles(&["X"]));
    }

    #[test]
    fn relative_paths_are_rejected() {
        let node = DirectoryNode::new(
            GroupId::root(),
            "Broken",
            "Functions",
            None,
            BTreeSet::new(),
            BTreeSet::new(),
            false,
        );
        assert!(node.is_err());
    }

    #[test]
    fn non_uuid_group_ids_do_not_parse() {
        assert!(GroupId::parse("store-manager").is_none());
        assert!(GroupId::from_str("").is_err());
        assert!(GroupId::root().is_root());
    }

    #[test]
    fn prefix_matching_is_not_segment_aware() {
        assert!(MembershipDirection::Down.reaches("/Team10", "/Team1"));
        assert!(MembershipDirection::Up.reaches("/Team1", "/Team10"));
        assert!(!MembershipDirection::None.reaches("/Team10", "/Team1"));
    }

    #[test]
    fn direction_parses_transport_values() {
        assert_eq!(
            MembershipDirection::from_str("DOWN").ok(),
            Some(MembershipDirection::Down)
        );
        assert!(MembershipDirection::from_str("sideways").is_err());
    }

    proptest! {
        #[test]
        fn up_and_down_mirror_each_other(
            left in "(/[a-c]{1,2}){1,3}",
            right in "(/[a-c]{1,2}){1,3}",
        ) {
            prop_assert_eq!(
                MembershipDirection::Down.reaches(&left, &right),
                MembershipDirection::Up.reaches(&right, &left)
            );
        }

        #[test]
        fn every_direction_reaches_the_membership_itself(path in "(/[a-z]{1,4}){1,4}") {
            prop_assert!(MembershipDirection::None.reaches(&path, &path));
            prop_assert!(MembershipDirection::Up.reaches(&path, &path));
            prop_assert!(MembershipDirection::Down.reaches(&path, &path));
        }
    }
}
