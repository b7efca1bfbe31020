use std::time::Duration;

use auditum_application::{DirectoryClient, DirectoryLookup};
use auditum_core::AppError;
use auditum_domain::GroupId;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{GrantCredentials, KeycloakConfig, KeycloakDirectoryClient};

const TOKEN_PATH: &str = "/realms/acme/protocol/openid-connect/token";
const FUNCTIONS_ID: &str = "6f1c8a52-3f0a-4c1f-9d55-0f7f6a1c2b3d";

fn config(server: &MockServer) -> KeycloakConfig {
    let credentials = GrantCredentials::ClientCredentials {
        client_secret: "s3cret".to_owned(),
    };

    match KeycloakConfig::new(server.uri().as_str(), "acme", "auditum", credentials) {
        Ok(config) => config,
        Err(error) => panic!("test config should be valid: {error}"),
    }
}

fn client(server: &MockServer) -> KeycloakDirectoryClient {
    match KeycloakDirectoryClient::new(config(server)) {
        Ok(client) => client,
        Err(error) => panic!("client should build: {error}"),
    }
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "expires_in": 300
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn functions_id() -> GroupId {
    GroupId::parse(FUNCTIONS_ID).unwrap_or_else(GroupId::root)
}

#[tokio::test]
async fn groups_are_fetched_with_full_representation_and_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/groups"))
        .and(query_param("briefRepresentation", "false"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": FUNCTIONS_ID,
            "name": "Functions",
            "path": "/Functions",
            "realmRoles": ["ROLE_X"],
            "subGroups": []
        }])))
        .mount(&server)
        .await;

    let Ok(DirectoryLookup::Found(groups)) = client(&server).fetch_groups().await else {
        panic!("groups should be found");
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.first().map(|group| group.id), Some(functions_id()));
}

#[tokio::test]
async fn token_is_reused_across_requests() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "r-1", "name": "auditor", "composite": false }
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.fetch_roles().await.is_ok());
    assert!(client.fetch_roles().await.is_ok());
}

#[tokio::test]
async fn client_errors_are_soft_misses() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("/admin/realms/acme/groups/{FUNCTIONS_ID}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles/auditor"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.fetch_group(functions_id()).await,
        Ok(DirectoryLookup::Missing)
    ));
    assert!(matches!(
        client.fetch_role_by_name("auditor").await,
        Ok(DirectoryLookup::Missing)
    ));
}

#[tokio::test]
async fn server_errors_are_hard_failures() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/groups"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client(&server).fetch_groups().await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn slow_responses_time_out_as_hard_failures() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = config(&server).with_timeout(Duration::from_millis(200));
    let Ok(client) = config.and_then(KeycloakDirectoryClient::new) else {
        panic!("client should build");
    };

    let result = client.fetch_roles().await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn malformed_payload_is_an_internal_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = client(&server).fetch_roles().await;
    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn rejected_credentials_fail_to_connect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = KeycloakDirectoryClient::connect(config(&server)).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn expired_token_is_refreshed_once_on_unauthorized() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = client(&server).fetch_roles().await;
    assert!(matches!(result, Ok(DirectoryLookup::Found(roles)) if roles.is_empty()));
}

#[tokio::test]
async fn username_lookup_uses_exact_search() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/users"))
        .and(query_param("username", "jdoe"))
        .and(query_param("exact", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u-1", "username": "jdoe", "enabled": true }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/acme/users"))
        .and(query_param("username", "ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server);
    let found = client.fetch_user_by_username("jdoe").await;
    assert!(matches!(found, Ok(DirectoryLookup::Found(user)) if user.id == "u-1"));
    assert!(matches!(
        client.fetch_user_by_username("ghost").await,
        Ok(DirectoryLookup::Missing)
    ));
}
