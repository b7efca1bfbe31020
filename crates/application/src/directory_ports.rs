use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use auditum_core::AppResult;
use auditum_domain::GroupId;
use serde::Serialize;

/// Attribute flagging a group as hidden from externally visible results.
pub const HIDDEN_ATTRIBUTE: &str = "hidden";

/// Outcome of a directory call that reached the service.
///
/// Client-side rejections (any 4xx) surface as `Missing`; transport failures,
/// timeouts and server errors are returned as `Err` by the client instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryLookup<T> {
    /// The directory returned a payload.
    Found(T),
    /// The directory rejected the request or does not know the entity.
    Missing,
}

impl<T> DirectoryLookup<T> {
    /// Returns the payload, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing => None,
        }
    }

    /// Returns whether the directory returned nothing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Maps the payload, keeping `Missing` as is.
    pub fn map<U, F>(self, transform: F) -> DirectoryLookup<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Found(value) => DirectoryLookup::Found(transform(value)),
            Self::Missing => DirectoryLookup::Missing,
        }
    }
}

impl<T: Default> DirectoryLookup<T> {
    /// Returns the payload, or an empty value when the directory returned nothing.
    pub fn or_empty(self) -> T {
        self.found().unwrap_or_default()
    }
}

/// Group as returned by the directory, optionally with nested subgroups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Directory-assigned id.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Unique slash-separated path.
    pub path: String,
    /// Realm roles assigned directly to the group.
    pub realm_roles: BTreeSet<String>,
    /// Free-form directory attributes.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Nested groups, one level or a full subtree depending on the call.
    pub sub_groups: Vec<DirectoryGroup>,
}

impl DirectoryGroup {
    /// Returns whether the group carries an explicit hidden attribute.
    ///
    /// A missing attribute means visible.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.attributes
            .get(HIDDEN_ATTRIBUTE)
            .and_then(|values| values.first())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }
}

/// User as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DirectoryUser {
    /// Directory user id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Given name, if set.
    pub first_name: Option<String>,
    /// Family name, if set.
    pub last_name: Option<String>,
    /// Email address, if set.
    pub email: Option<String>,
    /// Whether the account is enabled.
    pub enabled: bool,
}

impl DirectoryUser {
    /// Returns "first last" when available, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Realm role as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DirectoryRole {
    /// Directory role id.
    pub id: String,
    /// Role name in directory form.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the role aggregates other roles.
    pub composite: bool,
}

/// Port for the external group/user/role directory.
///
/// Implementations perform no caching.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Lists top-level groups, each with one nested level of subgroups.
    async fn fetch_groups(&self) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>>;

    /// Fetches one group with its complete subtree.
    async fn fetch_group(&self, group_id: GroupId) -> AppResult<DirectoryLookup<DirectoryGroup>>;

    /// Lists users directly assigned to a group.
    async fn fetch_group_members(
        &self,
        group_id: GroupId,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>>;

    /// Lists groups a user is directly assigned to, without subtrees.
    async fn fetch_user_groups(
        &self,
        user_id: &str,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>>;

    /// Searches users, listing all of them when no term is given.
    async fn fetch_users(
        &self,
        search: Option<&str>,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>>;

    /// Fetches one user by id.
    async fn fetch_user_by_id(&self, user_id: &str) -> AppResult<DirectoryLookup<DirectoryUser>>;

    /// Fetches one user by exact username.
    async fn fetch_user_by_username(
        &self,
        username: &str,
    ) -> AppResult<DirectoryLookup<DirectoryUser>>;

    /// Lists realm roles.
    async fn fetch_roles(&self) -> AppResult<DirectoryLookup<Vec<DirectoryRole>>>;

    /// Fetches one realm role by id.
    async fn fetch_role_by_id(&self, role_id: &str) -> AppResult<DirectoryLookup<DirectoryRole>>;

    /// Fetches one realm role by name.
    async fn fetch_role_by_name(&self, name: &str) -> AppResult<DirectoryLookup<DirectoryRole>>;
}
