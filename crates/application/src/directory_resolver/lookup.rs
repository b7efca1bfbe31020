use auditum_core::{AppResult, is_valid_id, to_external_role};
use auditum_domain::{DirectoryNode, GroupId, UserPrincipal};

use crate::{DirectoryRole, DirectoryUser};

use super::DirectoryResolver;

impl DirectoryResolver {
    /// Returns the visible group with the given id.
    ///
    /// Identifiers that are not UUIDs resolve to nothing.
    pub async fn group(&self, id: &str) -> AppResult<Option<DirectoryNode>> {
        let Some(group_id) = GroupId::parse(id) else {
            return Ok(None);
        };

        Ok(self.visible_tree().await?.get(&group_id).cloned())
    }

    /// Returns the id of the visible group at `path`, `None` when no such group exists.
    pub async fn group_id(&self, path: &str) -> AppResult<Option<GroupId>> {
        Ok(self
            .visible_tree()
            .await?
            .find_by_path(path)
            .map(DirectoryNode::id))
    }

    /// Returns the ancestors of a group, nearest first.
    pub async fn parent_groups(&self, group_id: GroupId) -> AppResult<Vec<DirectoryNode>> {
        Ok(self
            .visible_tree()
            .await?
            .ancestors_of(&group_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns the direct children of a group, sorted by path.
    pub async fn children_groups(&self, group_id: GroupId) -> AppResult<Vec<DirectoryNode>> {
        Ok(self
            .visible_tree()
            .await?
            .children_of(&group_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns a directory user by id, or by username when the identifier is not a UUID.
    pub async fn user(&self, identifier: &str) -> AppResult<Option<DirectoryUser>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }

        let lookup = if is_valid_id(identifier) {
            self.client.fetch_user_by_id(identifier).await?
        } else {
            self.client.fetch_user_by_username(identifier).await?
        };

        Ok(lookup.found())
    }

    /// Returns a user together with its direct, visible group memberships.
    pub async fn user_principal(&self, identifier: &str) -> AppResult<Option<UserPrincipal>> {
        let Some(user) = self.user(identifier).await? else {
            return Ok(None);
        };

        let tree = self.visible_tree().await?;
        let mut group_ids: Vec<GroupId> = self
            .client
            .fetch_user_groups(user.id.as_str())
            .await?
            .or_empty()
            .into_iter()
            .map(|group| group.id)
            .filter(|group_id| tree.contains(group_id))
            .collect();
        group_ids.sort();

        Ok(Some(UserPrincipal {
            id: user.id,
            username: user.username,
            group_ids,
        }))
    }

    /// Searches directory users.
    pub async fn users(&self, search: Option<&str>) -> AppResult<Vec<DirectoryUser>> {
        let search = search.map(str::trim).filter(|term| !term.is_empty());
        Ok(self.client.fetch_users(search).await?.or_empty())
    }

    /// Lists users directly assigned to a visible group.
    pub async fn group_members(&self, group_id: GroupId) -> AppResult<Vec<DirectoryUser>> {
        if !self.visible_tree().await?.contains(&group_id) || group_id.is_root() {
            return Ok(Vec::new());
        }

        Ok(self.client.fetch_group_members(group_id).await?.or_empty())
    }

    /// Returns a realm role by id, or by name when the identifier is not a UUID.
    pub async fn role(&self, identifier: &str) -> AppResult<Option<DirectoryRole>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }

        let lookup = if is_valid_id(identifier) {
            self.client.fetch_role_by_id(identifier).await?
        } else {
            let name = to_external_role(identifier);
            self.client.fetch_role_by_name(name.as_str()).await?
        };

        Ok(lookup.found())
    }

    /// Lists realm roles.
    pub async fn roles(&self) -> AppResult<Vec<DirectoryRole>> {
        Ok(self.client.fetch_roles().await?.or_empty())
    }
}
