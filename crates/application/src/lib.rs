//! Application services and ports.

#![forbid(unsafe_code)]

mod directory_ports;
mod directory_resolver;
mod permission_ports;
mod permission_query_service;
mod target_service;

#[cfg(test)]
mod test_support;

pub use directory_ports::{
    DirectoryClient, DirectoryGroup, DirectoryLookup, DirectoryRole, DirectoryUser,
    HIDDEN_ATTRIBUTE,
};
pub use directory_resolver::DirectoryResolver;
pub use permission_ports::PermissionGrantRepository;
pub use permission_query_service::{PermissionQueryService, PermissionScope};
pub use target_service::TargetService;
