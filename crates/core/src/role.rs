use std::collections::BTreeSet;

/// Prefix the authorization framework puts in front of directory role names.
pub const INTERNAL_ROLE_PREFIX: &str = "ROLE_";

/// Converts a role name to the bare form used by the directory.
///
/// Repeated prefixes collapse, so `ROLE_ROLE_auditor` and `ROLE_auditor` both
/// map to `auditor`.
#[must_use]
pub fn to_external_role(name: &str) -> String {
    name.trim_start_matches(INTERNAL_ROLE_PREFIX).to_owned()
}

/// Converts a role name to the prefixed form used by the authorization framework.
///
/// The result always carries exactly one prefix.
#[must_use]
pub fn to_internal_role(name: &str) -> String {
    format!("{INTERNAL_ROLE_PREFIX}{}", to_external_role(name))
}

/// Converts every role name in the iterator to the directory form.
pub fn to_external_roles<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| to_external_role(name.as_ref()))
        .collect()
}

/// Converts every role name in the iterator to the authorization framework form.
pub fn to_internal_roles<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| to_internal_role(name.as_ref()))
        .collect()
}
