use std::time::Duration;

use auditum_core::{AppError, AppResult};
use url::Url;

/// Default bound applied to every directory request.
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth grant used to obtain the admin API token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantCredentials {
    /// Service account of a confidential client.
    ClientCredentials {
        /// Client secret.
        client_secret: String,
    },
    /// Resource owner password grant.
    Password {
        /// Directory username.
        username: String,
        /// Directory password.
        password: String,
        /// Secret for confidential clients.
        client_secret: Option<String>,
    },
}

impl GrantCredentials {
    pub(super) fn form(&self, client_id: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("client_id", client_id.to_owned())];

        match self {
            Self::ClientCredentials { client_secret } => {
                form.push(("grant_type", "client_credentials".to_owned()));
                form.push(("client_secret", client_secret.clone()));
            }
            Self::Password {
                username,
                password,
                client_secret,
            } => {
                form.push(("grant_type", "password".to_owned()));
                form.push(("username", username.clone()));
                form.push(("password", password.clone()));
                if let Some(client_secret) = client_secret {
                    form.push(("client_secret", client_secret.clone()));
                }
            }
        }

        form
    }
}

/// Connection settings for a Keycloak realm.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    base_url: Url,
    realm: String,
    client_id: String,
    credentials: GrantCredentials,
    timeout: Duration,
}

impl KeycloakConfig {
    /// Validates and builds a configuration.
    pub fn new(
        base_url: &str,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        credentials: GrantCredentials,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid directory url '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "directory url '{base_url}' cannot be used as a base url"
            )));
        }

        let realm = realm.into().trim().to_owned();
        if realm.is_empty() {
            return Err(AppError::Validation(
                "directory realm must not be empty".to_owned(),
            ));
        }

        let client_id = client_id.into().trim().to_owned();
        if client_id.is_empty() {
            return Err(AppError::Validation(
                "directory client id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            base_url,
            realm,
            client_id,
            credentials,
            timeout: DEFAULT_DIRECTORY_TIMEOUT,
        })
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        if timeout.is_zero() {
            return Err(AppError::Validation(
                "directory timeout must be greater than zero".to_owned(),
            ));
        }

        self.timeout = timeout;
        Ok(self)
    }

    /// Returns the realm name.
    #[must_use]
    pub fn realm(&self) -> &str {
        self.realm.as_str()
    }

    /// Returns the OAuth client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(super) fn credentials(&self) -> &GrantCredentials {
        &self.credentials
    }

    /// `{base}/realms/{realm}/protocol/openid-connect/token`
    pub(super) fn token_url(&self) -> AppResult<Url> {
        self.url_with(&[
            "realms",
            self.realm.as_str(),
            "protocol",
            "openid-connect",
            "token",
        ])
    }

    /// `{base}/admin/realms/{realm}/{segments...}`
    pub(super) fn admin_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut all = vec!["admin", "realms", self.realm.as_str()];
        all.extend_from_slice(segments);
        self.url_with(&all)
    }

    fn url_with(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!(
                    "directory url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
