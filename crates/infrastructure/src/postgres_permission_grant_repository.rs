use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;

use auditum_application::{PermissionGrantRepository, PermissionScope};
use auditum_core::{AppError, AppResult};
use auditum_domain::{PermissionGrant, ResourceId, Right};

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::push_permission_scope;


/// PostgreSQL-backed repository for role grants on resources.
#[derive(Clone)]
pub struct PostgresPermissionGrantRepository {
    pool: PgPool,
}

impl PostgresPermissionGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a grant; granting twice is a no-op.
    pub async fn save_grant(&self, grant: &PermissionGrant) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_grants (role, permission_right, resource_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role, permission_right, resource_id) DO NOTHING
            "#,
        )
        .bind(grant.role())
        .bind(grant.right().as_str())
        .bind(grant.resource_id().as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save permission grant: {error}")))?;

        Ok(())
    }

    /// Removes a grant, returning whether it existed.
    pub async fn revoke_grant(&self, grant: &PermissionGrant) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM permission_grants
            WHERE role = $1 AND permission_right = $2 AND resource_id = $3
            "#,
        )
        .bind(grant.role())
        .bind(grant.right().as_str())
        .bind(grant.resource_id().as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to revoke permission grant: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists grants on the resources inside `scope`.
    pub async fn grants_within(&self, scope: &PermissionScope) -> AppResult<Vec<PermissionGrant>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT role, permission_right, resource_id FROM permission_grants WHERE ",
        );
        push_permission_scope(&mut builder, scope, "resource_id");
        builder.push(" ORDER BY resource_id, role, permission_right");

        let rows = builder
            .build_query_as::<GrantRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list scoped permission grants: {error}"))
            })?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role: String,
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    resource_id: Uuid,
}

#[derive(Debug, FromRow)]
struct GrantRow {
    role: String,
    permission_right: String,
    resource_id: Uuid,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<PermissionGrant> {
        let right = Right::from_str(self.permission_right.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode right '{}' for role '{}': {error}",
                self.permission_right, self.role
            ))
        })?;

        Ok(PermissionGrant::new(
            self.role.as_str(),
            right,
            ResourceId::from_uuid(self.resource_id),
        ))
    }
}

#[async_trait]
impl PermissionGrantRepository for PostgresPermissionGrantRepository {
    async fn grants_for_right(&self, right: Right) -> AppResult<Vec<String>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT DISTINCT role
            FROM permission_grants
            WHERE permission_right = $1
            ORDER BY role
            "#,
        )
        .bind(right.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load roles for right '{}': {error}",
                right.as_str()
            ))
        })?;

        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    async fn grants_for_resource(
        &self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT role, permission_right, resource_id
            FROM permission_grants
            WHERE resource_id = $1
            ORDER BY role, permission_right
            "#,
        )
        .bind(resource_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load grants for resource '{resource_id}': {error}"
            ))
        })?;

        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn resource_ids_for_roles(
        &self,
        roles: &BTreeSet<String>,
        right: Right,
    ) -> AppResult<Vec<ResourceId>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let roles: Vec<String> = roles.iter().cloned().collect();
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT DISTINCT resource_id
            FROM permission_grants
            WHERE role = ANY($1)
                AND permission_right = $2
            ORDER BY resource_id
            "#,
        )
        .bind(roles)
        .bind(right.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load resources for right '{}': {error}",
                right.as_str()
            ))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ResourceId::from_uuid(row.resource_id))
            .collect())
    }
}
