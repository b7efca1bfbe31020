use std::collections::BTreeSet;

use auditum_core::{AppResult, to_external_roles};
use auditum_domain::{DirectoryNode, FlatGroupMap, GroupId};
use tracing::{debug, info, warn};

use crate::{DirectoryGroup, DirectoryLookup};

use super::DirectoryResolver;

impl DirectoryResolver {
    /// Fetches the whole group tree and flattens it into an id-indexed map.
    ///
    /// Root groups arrive with one nested level, which is dropped and
    /// re-fetched as a complete subtree per root.
    pub(super) async fn build_flat_map(&self) -> AppResult<FlatGroupMap> {
        let mut map = FlatGroupMap::new();
        map.insert(DirectoryNode::root(self.realm.as_str()));

        let roots = self.client.fetch_groups().await?.or_empty();

        for mut root in roots {
            root.sub_groups.clear();
            let root_id = root.id;

            let subtree = match self.client.fetch_group(root_id).await? {
                DirectoryLookup::Found(subtree) => subtree,
                DirectoryLookup::Missing => {
                    debug!(
                        group_id = %root_id,
                        "group subtree unavailable, keeping brief representation"
                    );
                    root
                }
            };

            flatten_group(subtree, GroupId::root(), &BTreeSet::new(), &mut map);
        }

        info!(
            realm = %self.realm,
            groups = map.len(),
            "directory tree flattened"
        );

        Ok(map)
    }
}

/// Emits `group` and its descendants into `map`.
///
/// `inherited` holds the own roles of every ancestor. Children are visited
/// before the node itself is emitted; the map is keyed by id so order is
/// irrelevant.
fn flatten_group(
    group: DirectoryGroup,
    parent_id: GroupId,
    inherited: &BTreeSet<String>,
    map: &mut FlatGroupMap,
) {
    let hidden = group.is_hidden();
    let DirectoryGroup {
        id,
        name,
        path,
        realm_roles,
        sub_groups,
        ..
    } = group;

    let own_roles = to_external_roles(realm_roles);
    let accumulated: BTreeSet<String> = inherited.union(&own_roles).cloned().collect();

    for child in sub_groups {
        flatten_group(child, id, &accumulated, map);
    }

    match DirectoryNode::new(
        id,
        name,
        path,
        Some(parent_id),
        own_roles,
        inherited.clone(),
        hidden,
    ) {
        Ok(node) => map.insert(node),
        Err(error) => warn!(group_id = %id, error = %error, "skipping malformed directory group"),
    }
}
