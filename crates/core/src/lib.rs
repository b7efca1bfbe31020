//! Shared primitives for all Rust crates in Auditum.

#![forbid(unsafe_code)]

/// Caller identity primitives shared across services.
pub mod auth;
/// Role name conversion between directory and authorization naming.
pub mod role;

use thiserror::Error;
use uuid::Uuid;

pub use auth::Caller;
pub use role::{to_external_role, to_external_roles, to_internal_role, to_internal_roles};

/// Result type used across Auditum crates.
pub type AppResult<T> = Result<T, AppError>;

/// Returns whether the value is a well-formed directory identifier.
///
/// Directory identifiers are UUIDs. Anything else is either a human-readable
/// name or garbage, and callers decide which.
#[must_use]
pub fn is_valid_id(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok()
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A remote dependency timed out, was unreachable or failed server-side.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
