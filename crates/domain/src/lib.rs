//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod directory;
mod security;
mod target;

pub use directory::{
    DirectoryNode, FlatGroupMap, GroupId, MembershipDirection, NodeType, ROOT_PATH, UserPrincipal,
};
pub use security::{PermissionGrant, ResourceId, Right};
pub use target::{Target, TargetType};
