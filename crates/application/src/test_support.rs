use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use auditum_core::{AppError, AppResult};
use auditum_domain::{GroupId, PermissionGrant, ResourceId, Right};
use uuid::Uuid;

use crate::{
    DirectoryClient, DirectoryGroup, DirectoryLookup, DirectoryRole, DirectoryUser,
    PermissionGrantRepository,
};

pub(crate) fn gid(value: u128) -> GroupId {
    GroupId::from_uuid(Uuid::from_u128(value))
}

pub(crate) fn uid(value: u128) -> String {
    Uuid::from_u128(value).to_string()
}

pub(crate) fn group(
    id: u128,
    path: &str,
    roles: &[&str],
    sub_groups: Vec<DirectoryGroup>,
) -> DirectoryGroup {
    DirectoryGroup {
        id: gid(id),
        name: path.rsplit('/').next().unwrap_or_default().to_owned(),
        path: path.to_owned(),
        realm_roles: roles.iter().map(|role| (*role).to_owned()).collect(),
        attributes: BTreeMap::new(),
        sub_groups,
    }
}

pub(crate) fn hidden(mut group: DirectoryGroup) -> DirectoryGroup {
    group
        .attributes
        .insert("hidden".to_owned(), vec!["true".to_owned()]);
    group
}

pub(crate) fn user(id: u128, username: &str) -> DirectoryUser {
    DirectoryUser {
        id: uid(id),
        username: username.to_owned(),
        enabled: true,
        ..DirectoryUser::default()
    }
}

/// In-memory directory serving complete group trees.
#[derive(Default)]
pub(crate) struct FakeDirectoryClient {
    pub(crate) roots: Vec<DirectoryGroup>,
    pub(crate) users: Vec<DirectoryUser>,
    pub(crate) memberships: HashMap<String, Vec<GroupId>>,
    pub(crate) roles: Vec<DirectoryRole>,
    pub(crate) missing_subtrees: HashSet<GroupId>,
    pub(crate) unavailable: AtomicBool,
    pub(crate) group_list_calls: AtomicUsize,
}

impl FakeDirectoryClient {
    pub(crate) fn with_roots(roots: Vec<DirectoryGroup>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    pub(crate) fn member(mut self, user: DirectoryUser, groups: &[u128]) -> Self {
        self.memberships
            .insert(user.id.clone(), groups.iter().map(|id| gid(*id)).collect());
        self.users.push(user);
        self
    }

    fn find(&self, group_id: GroupId) -> Option<&DirectoryGroup> {
        fn walk(groups: &[DirectoryGroup], group_id: GroupId) -> Option<&DirectoryGroup> {
            groups.iter().find_map(|group| {
                if group.id == group_id {
                    Some(group)
                } else {
                    walk(&group.sub_groups, group_id)
                }
            })
        }

        walk(&self.roots, group_id)
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("directory timed out".to_owned()));
        }
        Ok(())
    }
}

fn shallow(group: &DirectoryGroup) -> DirectoryGroup {
    DirectoryGroup {
        sub_groups: Vec::new(),
        ..group.clone()
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectoryClient {
    async fn fetch_groups(&self) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>> {
        self.group_list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(DirectoryLookup::Found(
            self.roots
                .iter()
                .map(|root| DirectoryGroup {
                    sub_groups: root.sub_groups.iter().map(shallow).collect(),
                    ..root.clone()
                })
                .collect(),
        ))
    }

    async fn fetch_group(&self, group_id: GroupId) -> AppResult<DirectoryLookup<DirectoryGroup>> {
        self.check_available()?;
        if self.missing_subtrees.contains(&group_id) {
            return Ok(DirectoryLookup::Missing);
        }

        Ok(match self.find(group_id) {
            Some(group) => DirectoryLookup::Found(group.clone()),
            None => DirectoryLookup::Missing,
        })
    }

    async fn fetch_group_members(
        &self,
        group_id: GroupId,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>> {
        self.check_available()?;
        if self.find(group_id).is_none() {
            return Ok(DirectoryLookup::Missing);
        }

        Ok(DirectoryLookup::Found(
            self.users
                .iter()
                .filter(|user| {
                    self.memberships
                        .get(&user.id)
                        .is_some_and(|groups| groups.contains(&group_id))
                })
                .cloned()
                .collect(),
        ))
    }

    async fn fetch_user_groups(
        &self,
        user_id: &str,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>> {
        self.check_available()?;
        let Some(groups) = self.memberships.get(user_id) else {
            return Ok(DirectoryLookup::Missing);
        };

        Ok(DirectoryLookup::Found(
            groups
                .iter()
                .map(|group_id| match self.find(*group_id) {
                    Some(found) => shallow(found),
                    None => DirectoryGroup {
                        id: *group_id,
                        name: "ghost".to_owned(),
                        path: "/ghost".to_owned(),
                        realm_roles: BTreeSet::new(),
                        attributes: BTreeMap::new(),
                        sub_groups: Vec::new(),
                    },
                })
                .collect(),
        ))
    }

    async fn fetch_users(
        &self,
        search: Option<&str>,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>> {
        self.check_available()?;
        Ok(DirectoryLookup::Found(
            self.users
                .iter()
                .filter(|user| search.is_none_or(|term| user.username.contains(term)))
                .cloned()
                .collect(),
        ))
    }

    async fn fetch_user_by_id(&self, user_id: &str) -> AppResult<DirectoryLookup<DirectoryUser>> {
        self.check_available()?;
        Ok(match self.users.iter().find(|user| user.id == user_id) {
            Some(user) => DirectoryLookup::Found(user.clone()),
            None => DirectoryLookup::Missing,
        })
    }

    async fn fetch_user_by_username(
        &self,
        username: &str,
    ) -> AppResult<DirectoryLookup<DirectoryUser>> {
        self.check_available()?;
        Ok(
            match self.users.iter().find(|user| user.username == username) {
                Some(user) => DirectoryLookup::Found(user.clone()),
                None => DirectoryLookup::Missing,
            },
        )
    }

    async fn fetch_roles(&self) -> AppResult<DirectoryLookup<Vec<DirectoryRole>>> {
        self.check_available()?;
        Ok(DirectoryLookup::Found(self.roles.clone()))
    }

    async fn fetch_role_by_id(&self, role_id: &str) -> AppResult<DirectoryLookup<DirectoryRole>> {
        self.check_available()?;
        Ok(match self.roles.iter().find(|role| role.id == role_id) {
            Some(role) => DirectoryLookup::Found(role.clone()),
            None => DirectoryLookup::Missing,
        })
    }

    async fn fetch_role_by_name(&self, name: &str) -> AppResult<DirectoryLookup<DirectoryRole>> {
        self.check_available()?;
        Ok(match self.roles.iter().find(|role| role.name == name) {
            Some(role) => DirectoryLookup::Found(role.clone()),
            None => DirectoryLookup::Missing,
        })
    }
}

/// Grant store holding a fixed list of grants.
#[derive(Default)]
pub(crate) struct FakePermissionGrantRepository {
    pub(crate) grants: Vec<PermissionGrant>,
}

impl FakePermissionGrantRepository {
    pub(crate) fn with_grants(grants: Vec<PermissionGrant>) -> Self {
        Self { grants }
    }
}

#[async_trait]
impl PermissionGrantRepository for FakePermissionGrantRepository {
    async fn grants_for_right(&self, right: Right) -> AppResult<Vec<String>> {
        Ok(self
            .grants
            .iter()
            .filter(|grant| grant.right() == right)
            .map(|grant| grant.role().to_owned())
            .collect())
    }

    async fn grants_for_resource(
        &self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .iter()
            .filter(|grant| grant.resource_id() == resource_id)
            .cloned()
            .collect())
    }

    async fn resource_ids_for_roles(
        &self,
        roles: &BTreeSet<String>,
        right: Right,
    ) -> AppResult<Vec<ResourceId>> {
        let mut resource_ids: Vec<ResourceId> = self
            .grants
            .iter()
            .filter(|grant| grant.right() == right && roles.contains(grant.role()))
            .map(PermissionGrant::resource_id)
            .collect();
        resource_ids.sort();
        resource_ids.dedup();
        Ok(resource_ids)
    }
}
