//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_grant_repository;
mod keycloak_directory_client;
mod permission_filter;
mod postgres_permission_grant_repository;

pub use in_memory_permission_grant_repository::InMemoryPermissionGrantRepository;
pub use keycloak_directory_client::{
    DEFAULT_DIRECTORY_TIMEOUT, GrantCredentials, KeycloakConfig, KeycloakDirectoryClient,
};
pub use permission_filter::push_permission_scope;
pub use postgres_permission_grant_repository::PostgresPermissionGrantRepository;
