use std::path::Path;
use std::sync::Arc;

use auditum_application::{PermissionGrantRepository, PermissionScope};
use auditum_core::{AppError, AppResult};
use auditum_domain::{PermissionGrant, ResourceId, Right};
use auditum_infrastructure::{InMemoryPermissionGrantRepository, PostgresPermissionGrantRepository};
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

/// Grant seed entry read from `AUDITUM_GRANTS_FILE`.
#[derive(Debug, Deserialize)]
struct GrantSeed {
    role: String,
    right: Right,
    resource_id: Uuid,
}

/// Grant storage selected from configuration.
pub enum GrantStore {
    Postgres(Arc<PostgresPermissionGrantRepository>),
    InMemory(Arc<InMemoryPermissionGrantRepository>),
}

impl GrantStore {
    pub async fn connect(database_url: &str) -> AppResult<(Self, PgPool)> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to connect to database: {error}"))
            })?;

        let store = Self::Postgres(Arc::new(PostgresPermissionGrantRepository::new(pool.clone())));
        Ok((store, pool))
    }

    pub fn in_memory(grants_file: Option<&Path>) -> AppResult<Self> {
        let grants = match grants_file {
            Some(path) => load_seed(path)?,
            None => Vec::new(),
        };
        info!(grants = grants.len(), "using in-memory grant store");

        Ok(Self::InMemory(Arc::new(
            InMemoryPermissionGrantRepository::with_grants(grants),
        )))
    }

    pub fn repository(&self) -> Arc<dyn PermissionGrantRepository> {
        match self {
            Self::Postgres(repository) => repository.clone(),
            Self::InMemory(repository) => repository.clone(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    pub async fn save_grant(&self, grant: &PermissionGrant) -> AppResult<()> {
        match self {
            Self::Postgres(repository) => repository.save_grant(grant).await,
            Self::InMemory(repository) => repository.save_grant(grant).await,
        }
    }

    pub async fn revoke_grant(&self, grant: &PermissionGrant) -> AppResult<bool> {
        match self {
            Self::Postgres(repository) => repository.revoke_grant(grant).await,
            Self::InMemory(repository) => repository.revoke_grant(grant).await,
        }
    }

    pub async fn grants_within(&self, scope: &PermissionScope) -> AppResult<Vec<PermissionGrant>> {
        match self {
            Self::Postgres(repository) => repository.grants_within(scope).await,
            Self::InMemory(repository) => repository.grants_within(scope).await,
        }
    }
}

fn load_seed(path: &Path) -> AppResult<Vec<PermissionGrant>> {
    let contents = std::fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read grants file '{}': {error}",
            path.display()
        ))
    })?;

    parse_seed(contents.as_str()).map_err(|error| {
        AppError::Validation(format!(
            "failed to parse grants file '{}': {error}",
            path.display()
        ))
    })
}

fn parse_seed(contents: &str) -> Result<Vec<PermissionGrant>, serde_json::Error> {
    let seeds = serde_json::from_str::<Vec<GrantSeed>>(contents)?;

    Ok(seeds
        .into_iter()
        .map(|seed| {
            PermissionGrant::new(
                seed.role.as_str(),
                seed.right,
                ResourceId::from_uuid(seed.resource_id),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use auditum_domain::Right;

    use super::parse_seed;

    #[test]
    fn seed_roles_are_canonicalized() {
        let grants = parse_seed(
            r#"[{
                "role": "ROLE_auditor",
                "right": "VIEW",
                "resource_id": "6f1c8a52-3f0a-4c1f-9d55-0f7f6a1c2b3d"
            }]"#,
        )
        .unwrap_or_default();

        assert_eq!(grants.len(), 1);
        assert!(
            grants
                .iter()
                .all(|grant| grant.role() == "auditor" && grant.right() == Right::View)
        );
    }

    #[test]
    fn malformed_seed_is_rejected() {
        assert!(parse_seed(r#"[{"role": "auditor", "right": "FLY"}]"#).is_err());
    }
}
