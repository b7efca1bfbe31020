use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::role::{to_external_role, to_external_roles};

/// Identity of whoever is asking for directory-scoped data.
///
/// Role names are held in the bare directory form regardless of the form
/// they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    user_id: Option<String>,
    display_name: String,
    roles: BTreeSet<String>,
    administrative: bool,
}

impl Caller {
    /// Creates a regular user caller from its directory id and role claims.
    #[must_use]
    pub fn user<I, S>(user_id: impl Into<String>, display_name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            user_id: Some(user_id.into()),
            display_name: display_name.into(),
            roles: to_external_roles(roles),
            administrative: false,
        }
    }

    /// Creates an administrative caller that bypasses permission narrowing.
    #[must_use]
    pub fn administrative(display_name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            display_name: display_name.into(),
            roles: BTreeSet::new(),
            administrative: true,
        }
    }

    /// Creates a caller from token claims, promoting it to administrative
    /// when the claims carry `admin_role` in either naming form.
    #[must_use]
    pub fn from_claims<I, S>(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        roles: I,
        admin_role: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut caller = Self::user(subject, display_name, roles);
        caller.administrative = caller.roles.contains(&to_external_role(admin_role));
        caller
    }

    /// Returns the directory user id, `None` for administrative callers
    /// created without one.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the display name for the caller.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the caller's roles in directory form.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns whether the caller bypasses permission narrowing.
    #[must_use]
    pub fn is_administrative(&self) -> bool {
        self.administrative
    }

    /// Returns the user id to resolve memberships for.
    ///
    /// Administrative callers resolve against the whole directory, which is
    /// requested with an empty id.
    #[must_use]
    pub fn membership_subject(&self) -> &str {
        if self.administrative {
            return "";
        }

        self.user_id.as_deref().unwrap_or("")
    }
}
