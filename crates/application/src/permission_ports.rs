use std::collections::BTreeSet;

use async_trait::async_trait;
use auditum_core::AppResult;
use auditum_domain::{PermissionGrant, ResourceId, Right};

/// Repository port for locally stored permission grants.
///
/// Role names cross this port in directory form.
#[async_trait]
pub trait PermissionGrantRepository: Send + Sync {
    /// Lists roles holding `right` on at least one resource.
    async fn grants_for_right(&self, right: Right) -> AppResult<Vec<String>>;

    /// Lists every grant attached to one resource.
    async fn grants_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<PermissionGrant>>;

    /// Lists resources on which any of `roles` holds `right`.
    async fn resource_ids_for_roles(
        &self,
        roles: &BTreeSet<String>,
        right: Right,
    ) -> AppResult<Vec<ResourceId>>;
}
