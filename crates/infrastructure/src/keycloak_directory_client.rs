mod config;
mod dto;
mod token;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use auditum_application::{
    DirectoryClient, DirectoryGroup, DirectoryLookup, DirectoryRole, DirectoryUser,
};
use auditum_core::{AppError, AppResult};
use auditum_domain::GroupId;
use chrono::Utc;
use reqwest::{StatusCode, header};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

pub use config::{DEFAULT_DIRECTORY_TIMEOUT, GrantCredentials, KeycloakConfig};

use dto::{GroupRepresentation, RoleRepresentation, UserRepresentation, into_groups};
use token::{CachedToken, TokenResponse};

/// Keycloak admin REST implementation of the directory port.
///
/// Holds a bearer token for the admin API and replaces it shortly before it
/// expires. Responses are never cached.
pub struct KeycloakDirectoryClient {
    http_client: reqwest::Client,
    config: KeycloakConfig,
    token: RwLock<Option<CachedToken>>,
}

impl KeycloakDirectoryClient {
    /// Creates a client; no request is made until the first call.
    pub fn new(config: KeycloakConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http_client,
            config,
            token: RwLock::new(None),
        })
    }

    /// Creates a client and acquires the first admin token.
    pub async fn connect(config: KeycloakConfig) -> AppResult<Self> {
        let client = Self::new(config)?;
        client.access_token().await?;
        Ok(client)
    }

    /// Returns the realm this client is bound to.
    #[must_use]
    pub fn realm(&self) -> &str {
        self.config.realm()
    }

    async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = self.token.read().await.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.access_token().to_owned());
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.access_token().to_owned());
        }

        let token = self.acquire_token().await?;
        let access_token = token.access_token().to_owned();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn acquire_token(&self) -> AppResult<CachedToken> {
        let url = self.config.token_url()?;
        let response = self
            .http_client
            .post(url)
            .form(&self.config.credentials().form(self.config.client_id()))
            .send()
            .await
            .map_err(|error| transport_error("token", &error))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::Unauthorized(format!(
                "directory rejected client '{}' with status {}",
                self.config.client_id(),
                status.as_u16()
            )));
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "directory token endpoint failed");
            return Err(AppError::Unavailable(format!(
                "directory token endpoint returned status {}",
                status.as_u16()
            )));
        }

        let token = decode::<TokenResponse>(response, "token").await?;
        debug!(
            realm = %self.config.realm(),
            expires_in = token.expires_in,
            "directory token acquired"
        );

        Ok(CachedToken::issued(token, Utc::now()))
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Issues an admin GET and classifies the outcome.
    ///
    /// A 401 drops the cached token and retries once with a fresh one.
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> AppResult<DirectoryLookup<T>> {
        let url = self.config.admin_url(segments)?;
        let mut retried = false;

        loop {
            let response = self.send_get(url.clone(), query).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                debug!(url = %url, "directory token rejected, refreshing");
                self.invalidate_token().await;
                retried = true;
                continue;
            }

            if status.is_client_error() {
                debug!(url = %url, status = status.as_u16(), "directory lookup missing");
                return Ok(DirectoryLookup::Missing);
            }

            if !status.is_success() {
                warn!(url = %url, status = status.as_u16(), "directory request failed");
                return Err(AppError::Unavailable(format!(
                    "directory returned status {} for '{}'",
                    status.as_u16(),
                    url.path()
                )));
            }

            return decode::<T>(response, url.path()).await.map(DirectoryLookup::Found);
        }
    }

    async fn send_get(&self, url: Url, query: &[(&str, &str)]) -> AppResult<reqwest::Response> {
        let access_token = self.access_token().await?;
        let path = url.path().to_owned();

        self.http_client
            .get(url)
            .query(query)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| transport_error(path.as_str(), &error))
    }
}

fn transport_error(target: &str, error: &reqwest::Error) -> AppError {
    if error.is_timeout() {
        warn!(target_path = %target, "directory request timed out");
        return AppError::Unavailable(format!("directory request '{target}' timed out"));
    }

    warn!(target_path = %target, error = %error, "directory request failed");
    AppError::Unavailable(format!("directory request '{target}' failed: {error}"))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, target: &str) -> AppResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|error| transport_error(target, &error))?;

    serde_json::from_slice::<T>(&body).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode directory response for '{target}': {error}"
        ))
    })
}

#[async_trait]
impl DirectoryClient for KeycloakDirectoryClient {
    async fn fetch_groups(&self) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>> {
        Ok(self
            .get_json::<Vec<GroupRepresentation>>(&["groups"], &[("briefRepresentation", "false")])
            .await?
            .map(into_groups))
    }

    async fn fetch_group(&self, group_id: GroupId) -> AppResult<DirectoryLookup<DirectoryGroup>> {
        let group_id = group_id.to_string();
        let lookup = self
            .get_json::<GroupRepresentation>(
                &["groups", group_id.as_str()],
                &[("briefRepresentation", "false")],
            )
            .await?;

        Ok(match lookup.found().and_then(GroupRepresentation::into_group) {
            Some(group) => DirectoryLookup::Found(group),
            None => DirectoryLookup::Missing,
        })
    }

    async fn fetch_group_members(
        &self,
        group_id: GroupId,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>> {
        let group_id = group_id.to_string();
        Ok(self
            .get_json::<Vec<UserRepresentation>>(&["groups", group_id.as_str(), "members"], &[])
            .await?
            .map(|users| users.into_iter().map(DirectoryUser::from).collect()))
    }

    async fn fetch_user_groups(
        &self,
        user_id: &str,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryGroup>>> {
        Ok(self
            .get_json::<Vec<GroupRepresentation>>(
                &["users", user_id, "groups"],
                &[("briefRepresentation", "false")],
            )
            .await?
            .map(into_groups))
    }

    async fn fetch_users(
        &self,
        search: Option<&str>,
    ) -> AppResult<DirectoryLookup<Vec<DirectoryUser>>> {
        let query: Vec<(&str, &str)> = search.map(|term| ("search", term)).into_iter().collect();
        Ok(self
            .get_json::<Vec<UserRepresentation>>(&["users"], &query)
            .await?
            .map(|users| users.into_iter().map(DirectoryUser::from).collect()))
    }

    async fn fetch_user_by_id(&self, user_id: &str) -> AppResult<DirectoryLookup<DirectoryUser>> {
        Ok(self
            .get_json::<UserRepresentation>(&["users", user_id], &[])
            .await?
            .map(DirectoryUser::from))
    }

    async fn fetch_user_by_username(
        &self,
        username: &str,
    ) -> AppResult<DirectoryLookup<DirectoryUser>> {
        let users = self
            .get_json::<Vec<UserRepresentation>>(
                &["users"],
                &[("username", username), ("exact", "true")],
            )
            .await?
            .or_empty();

        Ok(match users.into_iter().next() {
            Some(user) => DirectoryLookup::Found(user.into()),
            None => DirectoryLookup::Missing,
        })
    }

    async fn fetch_roles(&self) -> AppResult<DirectoryLookup<Vec<DirectoryRole>>> {
        Ok(self
            .get_json::<Vec<RoleRepresentation>>(&["roles"], &[])
            .await?
            .map(|roles| roles.into_iter().map(DirectoryRole::from).collect()))
    }

    async fn fetch_role_by_id(&self, role_id: &str) -> AppResult<DirectoryLookup<DirectoryRole>> {
        Ok(self
            .get_json::<RoleRepresentation>(&["roles-by-id", role_id], &[])
            .await?
            .map(DirectoryRole::from))
    }

    async fn fetch_role_by_name(&self, name: &str) -> AppResult<DirectoryLookup<DirectoryRole>> {
        Ok(self
            .get_json::<RoleRepresentation>(&["roles", name], &[])
            .await?
            .map(DirectoryRole::from))
    }
}
