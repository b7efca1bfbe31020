use std::collections::BTreeSet;

use auditum_core::{AppResult, is_valid_id, to_external_roles};
use auditum_domain::{DirectoryNode, FlatGroupMap, MembershipDirection};
use tracing::debug;

use super::DirectoryResolver;

impl DirectoryResolver {
    /// Resolves the groups a user is a member of.
    ///
    /// An empty `user` returns the whole visible tree. Direct memberships and
    /// their expansion are resolved over the full tree, so a hidden membership
    /// still reaches its visible descendants; hidden nodes are dropped from the
    /// result. A non-empty `roles` keeps only nodes carrying one of them and
    /// then tags every kept node with all of them.
    pub async fn user_groups<I, S>(
        &self,
        user: &str,
        direction: MembershipDirection,
        roles: I,
    ) -> AppResult<FlatGroupMap>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let role_filter = to_external_roles(roles);
        let user = user.trim();
        let mut groups = if user.is_empty() {
            self.visible_tree().await?.clone()
        } else {
            let tree = self.full_tree().await?;
            let direct = self.direct_memberships(user, tree).await?;
            expand_memberships(tree, direct, direction).visible()
        };

        apply_role_filter(&mut groups, &role_filter);
        Ok(groups)
    }

    async fn direct_memberships(&self, user: &str, tree: &FlatGroupMap) -> AppResult<FlatGroupMap> {
        let user_id = if is_valid_id(user) {
            user.to_owned()
        } else {
            match self.client.fetch_user_by_username(user).await?.found() {
                Some(found) => found.id,
                None => {
                    debug!(user = %user, "unknown directory user, no memberships");
                    return Ok(FlatGroupMap::new());
                }
            }
        };

        let memberships = self.client.fetch_user_groups(user_id.as_str()).await?.or_empty();

        Ok(memberships
            .into_iter()
            .filter_map(|group| tree.get(&group.id).cloned())
            .collect())
    }
}

/// Re-derives memberships by scanning the tree for nodes reached from any
/// direct membership.
pub(crate) fn expand_memberships(
    tree: &FlatGroupMap,
    direct: FlatGroupMap,
    direction: MembershipDirection,
) -> FlatGroupMap {
    if direction == MembershipDirection::None {
        return direct;
    }

    tree.filtered(|candidate| {
        direct
            .nodes()
            .any(|membership| direction.reaches(candidate.path(), membership.path()))
    })
}

pub(crate) fn apply_role_filter(groups: &mut FlatGroupMap, role_filter: &BTreeSet<String>) {
    if role_filter.is_empty() {
        return;
    }

    groups.retain(|node| node.has_any_role(role_filter));
    groups
        .nodes_mut()
        .for_each(|node: &mut DirectoryNode| node.annotate_roles(role_filter));
}
