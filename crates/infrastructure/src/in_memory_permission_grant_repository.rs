use std::collections::BTreeSet;

use async_trait::async_trait;
use auditum_application::{PermissionGrantRepository, PermissionScope};
use auditum_core::AppResult;
use auditum_domain::{PermissionGrant, ResourceId, Right};
use tokio::sync::RwLock;

/// In-memory grant store used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryPermissionGrantRepository {
    grants: RwLock<BTreeSet<GrantKey>>,
}

type GrantKey = (ResourceId, String, Right);

fn key(grant: &PermissionGrant) -> GrantKey {
    (grant.resource_id(), grant.role().to_owned(), grant.right())
}

fn from_key((resource_id, role, right): &GrantKey) -> PermissionGrant {
    PermissionGrant::new(role.as_str(), *right, *resource_id)
}

impl InMemoryPermissionGrantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with grants.
    #[must_use]
    pub fn with_grants<I>(grants: I) -> Self
    where
        I: IntoIterator<Item = PermissionGrant>,
    {
        Self {
            grants: RwLock::new(grants.into_iter().map(|grant| key(&grant)).collect()),
        }
    }

    /// Stores a grant; granting twice is a no-op.
    pub async fn save_grant(&self, grant: &PermissionGrant) -> AppResult<()> {
        self.grants.write().await.insert(key(grant));
        Ok(())
    }

    /// Removes a grant, returning whether it existed.
    pub async fn revoke_grant(&self, grant: &PermissionGrant) -> AppResult<bool> {
        Ok(self.grants.write().await.remove(&key(grant)))
    }

    /// Lists grants on the resources inside `scope`.
    pub async fn grants_within(&self, scope: &PermissionScope) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|(resource_id, _, _)| scope.allows(*resource_id))
            .map(from_key)
            .collect())
    }
}

#[async_trait]
impl PermissionGrantRepository for InMemoryPermissionGrantRepository {
    async fn grants_for_right(&self, right: Right) -> AppResult<Vec<String>> {
        let roles: BTreeSet<String> = self
            .grants
            .read()
            .await
            .iter()
            .filter(|(_, _, granted)| *granted == right)
            .map(|(_, role, _)| role.clone())
            .collect();

        Ok(roles.into_iter().collect())
    }

    async fn grants_for_resource(
        &self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|(granted_on, _, _)| *granted_on == resource_id)
            .map(from_key)
            .collect())
    }

    async fn resource_ids_for_roles(
        &self,
        roles: &BTreeSet<String>,
        right: Right,
    ) -> AppResult<Vec<ResourceId>> {
        let resource_ids: BTreeSet<ResourceId> = self
            .grants
            .read()
            .await
            .iter()
            .filter(|(_, role, granted)| *granted == right && roles.contains(role))
            .map(|(resource_id, _, _)| *resource_id)
            .collect();

        Ok(resource_ids.into_iter().collect())
    }
}
