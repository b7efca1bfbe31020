use std::collections::BTreeSet;
use std::sync::Arc;

use auditum_core::{AppError, AppResult, Caller};
use auditum_domain::{ResourceId, Right};
use tracing::debug;

use crate::PermissionGrantRepository;

/// Set of resources a query may return for one caller and right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionScope {
    /// No narrowing applies.
    Unrestricted,
    /// Only the listed resources are reachable.
    Restricted(BTreeSet<ResourceId>),
}

impl PermissionScope {
    /// Returns whether the scope lets `resource_id` through.
    #[must_use]
    pub fn allows(&self, resource_id: ResourceId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Restricted(resource_ids) => resource_ids.contains(&resource_id),
        }
    }

    /// Returns whether the scope applies no narrowing.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Keeps the rows whose resource is inside the scope.
    #[must_use]
    pub fn narrow<T, F>(&self, rows: Vec<T>, key: F) -> Vec<T>
    where
        F: Fn(&T) -> ResourceId,
    {
        match self {
            Self::Unrestricted => rows,
            Self::Restricted(_) => rows.into_iter().filter(|row| self.allows(key(row))).collect(),
        }
    }
}

/// Application service narrowing resource queries by role grants.
#[derive(Clone)]
pub struct PermissionQueryService {
    repository: Arc<dyn PermissionGrantRepository>,
}

impl PermissionQueryService {
    /// Creates a new permission query service from a grant repository.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionGrantRepository>) -> Self {
        Self { repository }
    }

    /// Resolves the resources on which `caller` holds `right`.
    pub async fn scope_for(&self, caller: &Caller, right: Right) -> AppResult<PermissionScope> {
        if caller.is_administrative() {
            return Ok(PermissionScope::Unrestricted);
        }

        if caller.roles().is_empty() {
            return Ok(PermissionScope::Restricted(BTreeSet::new()));
        }

        let resource_ids = self
            .repository
            .resource_ids_for_roles(caller.roles(), right)
            .await?;
        debug!(
            right = right.as_str(),
            resources = resource_ids.len(),
            "permission scope resolved"
        );

        Ok(PermissionScope::Restricted(resource_ids.into_iter().collect()))
    }

    /// Returns the rights `caller` holds on one resource.
    pub async fn rights_on_resource(
        &self,
        caller: &Caller,
        resource_id: ResourceId,
    ) -> AppResult<BTreeSet<Right>> {
        if caller.is_administrative() {
            return Ok(Right::all().iter().copied().collect());
        }

        Ok(self
            .repository
            .grants_for_resource(resource_id)
            .await?
            .into_iter()
            .filter(|grant| caller.roles().contains(grant.role()))
            .map(|grant| grant.right())
            .collect())
    }

    /// Ensures `caller` holds `right` on a resource.
    pub async fn require_right(
        &self,
        caller: &Caller,
        right: Right,
        resource_id: ResourceId,
    ) -> AppResult<()> {
        if self
            .rights_on_resource(caller, resource_id)
            .await?
            .contains(&right)
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "caller '{}' is missing right '{}' on resource '{resource_id}'",
            caller.display_name(),
            right.as_str()
        )))
    }
}
