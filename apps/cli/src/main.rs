//! Auditum directory inspection CLI.

#![forbid(unsafe_code)]

mod cli_args;
mod cli_config;
mod grant_store;

use std::io::Write;
use std::sync::Arc;

use auditum_application::{DirectoryResolver, PermissionQueryService, TargetService};
use auditum_core::{AppError, AppResult, Caller};
use auditum_domain::{PermissionGrant, ResourceId};
use auditum_infrastructure::KeycloakDirectoryClient;
use clap::Parser;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{info, warn};

use crate::cli_args::{CallerArgs, CliArgs, CliCommand, DirectoryCommand};
use crate::cli_config::{CliConfig, init_tracing, load_keycloak_config};
use crate::grant_store::GrantStore;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::load()?;

    let (store, pool) = match config.database_url.as_deref() {
        Some(database_url) => {
            let (store, pool) = GrantStore::connect(database_url).await?;
            (store, Some(pool))
        }
        None => (GrantStore::in_memory(config.grants_file.as_deref())?, None),
    };

    if let Err(error) = run(args.command, &config, &store, pool.as_ref()).await {
        warn!(error = %error, "command failed");
        return Err(error);
    }

    Ok(())
}

async fn run(
    command: CliCommand,
    config: &CliConfig,
    store: &GrantStore,
    pool: Option<&PgPool>,
) -> AppResult<()> {
    match command {
        CliCommand::Migrate => {
            let pool = pool.ok_or_else(|| {
                AppError::Validation("DATABASE_URL is required to run migrations".to_owned())
            })?;
            MIGRATOR.run(pool).await.map_err(|error| {
                AppError::Internal(format!("failed to run database migrations: {error}"))
            })?;
            info!("database migrations applied");
            Ok(())
        }
        CliCommand::Grant {
            role,
            right,
            resource,
        } => {
            require_persistent(store)?;
            let grant = PermissionGrant::new(role.as_str(), right, ResourceId::from_uuid(resource));
            store.save_grant(&grant).await?;
            print_json(&grant)
        }
        CliCommand::Revoke {
            role,
            right,
            resource,
        } => {
            require_persistent(store)?;
            let grant = PermissionGrant::new(role.as_str(), right, ResourceId::from_uuid(resource));
            let removed = store.revoke_grant(&grant).await?;
            print_json(&serde_json::json!({ "revoked": removed }))
        }
        CliCommand::Scope { right, caller } => {
            let caller = caller_from(&caller, config);
            let scope = PermissionQueryService::new(store.repository())
                .scope_for(&caller, right)
                .await?;
            print_json(&store.grants_within(&scope).await?)
        }
        CliCommand::Rights { resource, caller } => {
            let caller = caller_from(&caller, config);
            let rights = PermissionQueryService::new(store.repository())
                .rights_on_resource(&caller, ResourceId::from_uuid(resource))
                .await?;
            print_json(&rights)
        }
        CliCommand::Directory(directory_command) => {
            let client = KeycloakDirectoryClient::connect(load_keycloak_config()?).await?;
            let realm = client.realm().to_owned();
            let resolver = DirectoryResolver::new(Arc::new(client), realm);
            run_directory(directory_command, config, store, &resolver).await
        }
    }
}

async fn run_directory(
    command: DirectoryCommand,
    config: &CliConfig,
    store: &GrantStore,
    resolver: &DirectoryResolver,
) -> AppResult<()> {
    match command {
        DirectoryCommand::Groups { with_hidden } => {
            let groups = if with_hidden {
                resolver.flat_groups_with_hidden().await?
            } else {
                resolver.flat_groups().await?
            };
            print_json(&groups.sorted_by_path())
        }
        DirectoryCommand::Group { id } => {
            let group = resolver
                .group(id.as_str())
                .await?
                .ok_or_else(|| AppError::NotFound(format!("group '{id}' not found")))?;
            print_json(&group)
        }
        DirectoryCommand::GroupId { path } => {
            let group_id = resolver
                .group_id(path.as_str())
                .await?
                .ok_or_else(|| AppError::NotFound(format!("no group at path '{path}'")))?;
            print_json(&group_id)
        }
        DirectoryCommand::Parents { group } => {
            print_json(&resolver.parent_groups(group).await?)
        }
        DirectoryCommand::Children { group } => {
            print_json(&resolver.children_groups(group).await?)
        }
        DirectoryCommand::UserGroups {
            user,
            direction,
            roles,
        } => {
            let groups = resolver
                .user_groups(user.as_str(), direction, &roles)
                .await?;
            print_json(&groups.sorted_by_path())
        }
        DirectoryCommand::User { identifier } => {
            let principal = resolver
                .user_principal(identifier.as_str())
                .await?
                .ok_or_else(|| AppError::NotFound(format!("user '{identifier}' not found")))?;
            print_json(&principal)
        }
        DirectoryCommand::Users { search } => {
            print_json(&resolver.users(search.as_deref()).await?)
        }
        DirectoryCommand::Members { group } => {
            let targets = TargetService::new(store.repository())
                .group_member_targets(resolver, group)
                .await?;
            print_json(&targets)
        }
        DirectoryCommand::Role { identifier } => {
            let role = resolver
                .role(identifier.as_str())
                .await?
                .ok_or_else(|| AppError::NotFound(format!("role '{identifier}' not found")))?;
            print_json(&role)
        }
        DirectoryCommand::Roles => print_json(&resolver.roles().await?),
        DirectoryCommand::Targets { right, caller } => {
            let caller = caller_from(&caller, config);
            let targets = TargetService::new(store.repository())
                .reduce_targets(resolver, &caller, right)
                .await?;
            print_json(&targets)
        }
    }
}

fn caller_from(args: &CallerArgs, config: &CliConfig) -> Caller {
    match args.user.as_deref() {
        Some(user) => Caller::from_claims(user, user, &args.roles, config.admin_role.as_str()),
        None => Caller::administrative("cli"),
    }
}

fn require_persistent(store: &GrantStore) -> AppResult<()> {
    if store.is_persistent() {
        return Ok(());
    }

    Err(AppError::Validation(
        "DATABASE_URL is required to change grants".to_owned(),
    ))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|error| AppError::Internal(format!("failed to encode output: {error}")))?;
    writeln!(stdout)
        .map_err(|error| AppError::Internal(format!("failed to write output: {error}")))
}
