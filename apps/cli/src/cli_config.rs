use std::env;
use std::path::PathBuf;
use std::time::Duration;

use auditum_core::{AppError, AppResult};
use auditum_infrastructure::{DEFAULT_DIRECTORY_TIMEOUT, GrantCredentials, KeycloakConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Process-wide settings read from the environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub database_url: Option<String>,
    pub admin_role: String,
    pub grants_file: Option<PathBuf>,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        let database_url = optional_env("DATABASE_URL");
        let admin_role =
            optional_env("AUDITUM_ADMIN_ROLE").unwrap_or_else(|| DEFAULT_ADMIN_ROLE.to_owned());
        let grants_file = optional_env("AUDITUM_GRANTS_FILE").map(PathBuf::from);

        Ok(Self {
            database_url,
            admin_role,
            grants_file,
        })
    }
}

/// Reads the directory connection settings.
///
/// Loaded only by commands that talk to the directory.
pub fn load_keycloak_config() -> AppResult<KeycloakConfig> {
    let base_url = required_env("DIRECTORY_URL")?;
    let realm = required_env("DIRECTORY_REALM")?;
    let client_id = required_env("DIRECTORY_CLIENT_ID")?;
    let credentials = grant_credentials(
        optional_env("DIRECTORY_CLIENT_SECRET"),
        optional_env("DIRECTORY_USERNAME"),
        optional_env("DIRECTORY_PASSWORD"),
    )?;
    let timeout = parse_timeout(optional_env("DIRECTORY_TIMEOUT_SECS"))?;

    KeycloakConfig::new(base_url.as_str(), realm, client_id, credentials)?.with_timeout(timeout)
}

/// Picks the password grant when a username is configured, client credentials otherwise.
fn grant_credentials(
    client_secret: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> AppResult<GrantCredentials> {
    match (username, password, client_secret) {
        (Some(username), Some(password), client_secret) => Ok(GrantCredentials::Password {
            username,
            password,
            client_secret,
        }),
        (Some(_), None, _) => Err(AppError::Validation(
            "DIRECTORY_PASSWORD is required with DIRECTORY_USERNAME".to_owned(),
        )),
        (None, _, Some(client_secret)) => Ok(GrantCredentials::ClientCredentials { client_secret }),
        (None, _, None) => Err(AppError::Validation(
            "DIRECTORY_CLIENT_SECRET or DIRECTORY_USERNAME is required".to_owned(),
        )),
    }
}

fn parse_timeout(value: Option<String>) -> AppResult<Duration> {
    let Some(value) = value else {
        return Ok(DEFAULT_DIRECTORY_TIMEOUT);
    };

    let seconds = value.parse::<u64>().map_err(|error| {
        AppError::Validation(format!(
            "invalid DIRECTORY_TIMEOUT_SECS value '{value}': {error}"
        ))
    })?;
    if seconds == 0 {
        return Err(AppError::Validation(
            "DIRECTORY_TIMEOUT_SECS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_secs(seconds))
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    optional_env(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use auditum_core::AppError;
    use auditum_infrastructure::{DEFAULT_DIRECTORY_TIMEOUT, GrantCredentials};

    use super::{grant_credentials, parse_timeout};

    #[test]
    fn username_selects_password_grant() {
        let credentials = grant_credentials(
            Some("secret".to_owned()),
            Some("svc".to_owned()),
            Some("pw".to_owned()),
        );

        assert!(matches!(
            credentials,
            Ok(GrantCredentials::Password { client_secret: Some(_), .. })
        ));
    }

    #[test]
    fn client_secret_alone_selects_client_credentials() {
        let credentials = grant_credentials(Some("secret".to_owned()), None, None);
        assert!(matches!(
            credentials,
            Ok(GrantCredentials::ClientCredentials { .. })
        ));
    }

    #[test]
    fn incomplete_credentials_are_rejected() {
        assert!(matches!(
            grant_credentials(None, Some("svc".to_owned()), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            grant_credentials(None, None, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn timeout_defaults_and_rejects_zero() {
        assert_eq!(parse_timeout(None).ok(), Some(DEFAULT_DIRECTORY_TIMEOUT));
        assert_eq!(
            parse_timeout(Some("3".to_owned())).ok(),
            Some(Duration::from_secs(3))
        );
        assert!(parse_timeout(Some("0".to_owned())).is_err());
        assert!(parse_timeout(Some("soon".to_owned())).is_err());
    }
}
