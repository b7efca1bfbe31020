use std::fmt::{Display, Formatter};
use std::str::FromStr;

use auditum_core::{AppError, to_external_role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operation kinds a role can be granted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Right {
    /// Allows creating audits from the resource.
    Create,
    /// Allows updating audit answers.
    Update,
    /// Allows annotating answers.
    Annotate,
    /// Allows validating a submitted audit.
    Validate,
    /// Allows submitting an audit.
    Submit,
    /// Allows deleting audits.
    Delete,
    /// Allows reading audits.
    View,
    /// Allows reading aggregated statistics.
    Stats,
}

impl Right {
    /// Returns a stable storage value for this right.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Annotate => "annotate",
            Self::Validate => "validate",
            Self::Submit => "submit",
            Self::Delete => "delete",
            Self::View => "view",
            Self::Stats => "stats",
        }
    }

    /// Returns all known rights.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Right] = &[
            Right::Create,
            Right::Update,
            Right::Annotate,
            Right::Validate,
            Right::Submit,
            Right::Delete,
            Right::View,
            Right::Stats,
        ];

        ALL
    }
}

impl Display for Right {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Right {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "annotate" => Ok(Self::Annotate),
            "validate" => Ok(Self::Validate),
            "submit" => Ok(Self::Submit),
            "delete" => Ok(Self::Delete),
            "view" => Ok(Self::View),
            "stats" => Ok(Self::Stats),
            _ => Err(AppError::Validation(format!("unknown right value '{value}'"))),
        }
    }
}

/// Identifier of a resource permissions are granted on, such as a folder template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a random resource identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a resource identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stored association of a role with a right on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    role: String,
    right: Right,
    resource_id: ResourceId,
}

impl PermissionGrant {
    /// Creates a grant, storing the role in its directory form.
    #[must_use]
    pub fn new(role: &str, right: Right, resource_id: ResourceId) -> Self {
        Self {
            role: to_external_role(role),
            right,
            resource_id,
        }
    }

    /// Returns the role in directory form.
    #[must_use]
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// Returns the granted right.
    #[must_use]
    pub fn right(&self) -> Right {
        self.right
    }

    /// Returns the resource the right applies to.
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{PermissionGrant, ResourceId, Right};

    #[test]
    fn every_right_parses_from_its_storage_value() {
        for right in Right::all() {
            assert_eq!(Right::from_str(right.as_str()).ok(), Some(*right));
        }
        assert_eq!(Right::from_str("VIEW").ok(), Some(Right::View));
    }

    #[test]
    fn unknown_right_is_rejected() {
        assert!(Right::from_str("publish").is_err());
    }

    #[test]
    fn grant_stores_directory_role_name() {
        let grant = PermissionGrant::new("ROLE_auditor", Right::Submit, ResourceId::new());
        assert_eq!(grant.role(), "auditor");
        assert_eq!(grant.right(), Right::Submit);
    }
}
