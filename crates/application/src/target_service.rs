mod reduction;


use std::sync::Arc;

use auditum_core::{AppResult, Caller, to_external_roles};
use auditum_domain::{GroupId, MembershipDirection, Right, Target};
use tracing::debug;

use crate::{DirectoryResolver, PermissionGrantRepository};

use reduction::reduce;

/// Application service building permission-scoped target trees.
#[derive(Clone)]
pub struct TargetService {
    permission_repository: Arc<dyn PermissionGrantRepository>,
}

impl TargetService {
    /// Creates a new target service from a grant repository.
    #[must_use]
    pub fn new(permission_repository: Arc<dyn PermissionGrantRepository>) -> Self {
        Self {
            permission_repository,
        }
    }

    /// Returns the minimal target set through which `caller` exercises `right`.
    ///
    /// Groups the caller reaches downward through a role granted `right`
    /// carry the right; surviving ancestors are structural and carry none.
    /// Administrative callers start from the whole visible tree.
    pub async fn reduce_targets(
        &self,
        resolver: &DirectoryResolver,
        caller: &Caller,
        right: Right,
    ) -> AppResult<Vec<Target>> {
        let roles = to_external_roles(self.permission_repository.grants_for_right(right).await?);
        if roles.is_empty() {
            debug!(right = right.as_str(), "no role holds right, no targets");
            return Ok(Vec::new());
        }

        let base = resolver
            .user_groups(caller.membership_subject(), MembershipDirection::Down, &roles)
            .await?;
        let tree = resolver.visible_tree().await?;

        let targets = reduce(tree, &base, right);
        debug!(
            right = right.as_str(),
            base = base.len(),
            targets = targets.len(),
            "targets reduced"
        );

        Ok(targets)
    }

    /// Returns the direct members of a group as user targets under it.
    pub async fn group_member_targets(
        &self,
        resolver: &DirectoryResolver,
        group_id: GroupId,
    ) -> AppResult<Vec<Target>> {
        let mut members = resolver.group_members(group_id).await?;
        members.sort_by(|left, right| left.username.cmp(&right.username));

        Ok(members
            .into_iter()
            .map(|member| {
                let name = member.display_name();
                Target::user(member.id, name, group_id)
            })
            .collect())
    }
}
