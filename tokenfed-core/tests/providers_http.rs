//! Integration tests for the identity providers against mocked endpoints.
//!
//! These tests verify that:
//! - The client-credentials exchange sends the expected form and parses the response
//! - Vault login, secret read and exchange run in order and stop at the first failure
//! - Vault-sourced credentials never reach the credential store
//! - Static tokens are validated, with the environment as fallback
//! - Slow endpoints fail with a timeout under the step that stalled

#![cfg(feature = "oauth")]

use chrono::Duration;
use std::sync::Arc;
use tokenfed_core::{
    settings::{VAULT_PATH_KEY, VAULT_ROLE_KEY, VAULT_URL_KEY},
    ClientCredential, ClientCredentialsProvider, CredentialExchange, FailureReason,
    MemoryStore, ProviderError, ProviderSettings, Scope, Secret, SecretStore,
    StaticTokenProvider, TokenGenerator, VaultProvider,
};
use wiremock::{
    matchers::{body_json, body_string_contains, header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const SHORT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);
const STALL: std::time::Duration = std::time::Duration::from_secs(3);

fn token_response(token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in,
    }))
}

fn direct_provider(server: &MockServer) -> ClientCredentialsProvider {
    ClientCredentialsProvider::new(format!("{}/token", server.uri())).with_timeout(TIMEOUT)
}

#[tokio::test]
async fn test_client_credentials_exchange_sends_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=my-id"))
        .and(body_string_contains("client_secret=my-secret"))
        .and(body_string_contains("scope=execution"))
        .respond_with(token_response("tok_123", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let token = direct_provider(&server)
        .exchange(&ClientCredential::new("my-id", "my-secret"), Scope::Execution)
        .await
        .unwrap();

    assert_eq!(token.access_token.expose(), "tok_123");
    assert_eq!(token.expires_in, Duration::seconds(3600));
}

#[tokio::test]
async fn test_unmapped_scope_sends_no_scope_parameter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(|req: &Request| !String::from_utf8_lossy(&req.body).contains("scope="))
        .respond_with(token_response("unscoped", 60))
        .expect(1)
        .mount(&server)
        .await;

    let provider = direct_provider(&server).with_scopes(Default::default());
    let token = provider
        .exchange(&ClientCredential::new("id", "secret"), Scope::Read)
        .await
        .unwrap();

    assert_eq!(token.access_token.expose(), "unscoped");
}

#[tokio::test]
async fn test_client_credentials_rejection_is_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "bad secret",
        })))
        .mount(&server)
        .await;

    let result = direct_provider(&server)
        .exchange(&ClientCredential::new("id", "wrong"), Scope::Execution)
        .await;

    match result {
        Err(ProviderError::AuthenticationFailed { reason }) => {
            assert!(matches!(reason, FailureReason::Rejected(_)));
            assert!(!reason.is_transient());
        }
        other => panic!("expected AuthenticationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_credentials_server_error_is_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = direct_provider(&server)
        .exchange(&ClientCredential::new("id", "secret"), Scope::Execution)
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn test_client_credentials_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response("too-late", 3600).set_delay(STALL))
        .mount(&server)
        .await;

    let provider = direct_provider(&server).with_timeout(SHORT_TIMEOUT);
    let result = provider
        .exchange(&ClientCredential::new("id", "secret"), Scope::Read)
        .await;

    match result {
        Err(ProviderError::AuthenticationFailed { reason }) => {
            assert_eq!(reason, FailureReason::Timeout(1));
            assert!(reason.is_transient());
        }
        other => panic!("expected AuthenticationFailed, got {:?}", other),
    }
}

async fn vault_fixture(server: &MockServer) -> (VaultProvider, Arc<MemoryStore>) {
    vault_fixture_with_timeout(server, TIMEOUT).await
}

async fn vault_fixture_with_timeout(
    server: &MockServer,
    timeout: std::time::Duration,
) -> (VaultProvider, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store
        .set(VAULT_URL_KEY, &Secret::new(server.uri()))
        .await
        .unwrap();
    store
        .set(VAULT_ROLE_KEY, &Secret::new("ci-role"))
        .await
        .unwrap();

    let provider = VaultProvider::new(
        ProviderSettings::new(store.clone()),
        Arc::new(direct_provider(server)),
        timeout,
    )
    .unwrap();
    (provider, store)
}

#[tokio::test]
async fn test_vault_flow_exchanges_fetched_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .and(body_json(serde_json::json!({ "role": "ci-role" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "auth": { "client_token": "s.session" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/stackspot"))
        .and(header("X-Vault-Token", "s.session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "data": { "client_id": "vault-id", "client_secret": "vault-secret" },
                "metadata": { "version": 3 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("client_id=vault-id"))
        .and(body_string_contains("client_secret=vault-secret"))
        .respond_with(token_response("vault-issued", 900))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, store) = vault_fixture(&server).await;
    let token = provider.generate(Scope::Execution).await.unwrap();

    assert_eq!(token.access_token.expose(), "vault-issued");
    assert_eq!(token.expires_in, Duration::seconds(900));

    // Only the two settings written by the fixture are stored.
    assert_eq!(store.len(), 2);
    assert!(store.get("stackspot_client_id").await.unwrap().is_none());
    assert!(store.get("stackspot_client_secret").await.unwrap().is_none());
}

#[tokio::test]
async fn test_vault_uses_saved_secret_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "auth": { "client_token": "s.session" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/data/team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "data": { "client_id": "team-id", "client_secret": "team-secret" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("client_id=team-id"))
        .respond_with(token_response("team-token", 60))
        .mount(&server)
        .await;

    let (provider, store) = vault_fixture(&server).await;
    store
        .set(VAULT_PATH_KEY, &Secret::new("kv/data/team-a"))
        .await
        .unwrap();

    let token = provider.generate(Scope::Read).await.unwrap();
    assert_eq!(token.access_token.expose(), "team-token");
}

#[tokio::test]
async fn test_vault_login_failure_skips_secret_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"errors":["permission denied"]}"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/stackspot"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response("never", 60))
        .expect(0)
        .mount(&server)
        .await;

    let (provider, _store) = vault_fixture(&server).await;
    let result = provider.generate(Scope::Execution).await;

    match result {
        Err(ProviderError::CloudAuthFailed { reason }) => {
            assert!(matches!(reason, FailureReason::Rejected(_)));
        }
        other => panic!("expected CloudAuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vault_login_timeout_is_cloud_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "auth": { "client_token": "s.late" } }))
                .set_delay(STALL),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/stackspot"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (provider, _store) = vault_fixture_with_timeout(&server, SHORT_TIMEOUT).await;
    let result = provider.generate(Scope::Execution).await;

    match result {
        Err(ProviderError::CloudAuthFailed { reason }) => {
            assert_eq!(reason, FailureReason::Timeout(1));
        }
        other => panic!("expected CloudAuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vault_secret_read_timeout_is_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "auth": { "client_token": "s.session" } })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/stackspot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "data": { "data": { "client_id": "id", "client_secret": "s" } }
                }))
                .set_delay(STALL),
        )
        .mount(&server)
        .await;

    let (provider, _store) = vault_fixture_with_timeout(&server, SHORT_TIMEOUT).await;
    let result = provider.generate(Scope::Execution).await;

    match result {
        Err(ProviderError::SecretFetchFailed { reason }) => {
            assert_eq!(reason, FailureReason::Timeout(1));
        }
        other => panic!("expected SecretFetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vault_incomplete_secret_is_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/aws/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "auth": { "client_token": "s.session" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/data/stackspot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "data": { "client_id": "only-id" } }
        })))
        .mount(&server)
        .await;

    let (provider, _store) = vault_fixture(&server).await;
    let result = provider.generate(Scope::Execution).await;

    match result {
        Err(ProviderError::SecretFetchFailed { reason }) => {
            assert!(matches!(reason, FailureReason::Malformed(_)));
        }
        other => panic!("expected SecretFetchFailed, got {:?}", other),
    }
}

fn static_provider(server: &MockServer, env_var: &str) -> (StaticTokenProvider, ProviderSettings) {
    let settings = ProviderSettings::new(Arc::new(MemoryStore::new()));
    let provider = StaticTokenProvider::new(settings.clone(), TIMEOUT)
        .unwrap()
        .with_api_url(server.uri())
        .with_env_var(env_var);
    (provider, settings)
}

#[tokio::test]
async fn test_static_token_is_validated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "token ghp_live"))
        .and(header("Accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "login": "octocat"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, settings) = static_provider(&server, "TOKENFED_IT_UNSET_TOKEN");
    settings.save_static_token("ghp_live").await.unwrap();

    let token = provider.generate(Scope::Read).await.unwrap();
    assert_eq!(token.access_token.expose(), "ghp_live");
    assert_eq!(token.expires_in, Duration::days(365));
}

#[tokio::test]
async fn test_static_token_rejected_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (provider, settings) = static_provider(&server, "TOKENFED_IT_UNSET_TOKEN");
    settings.save_static_token("ghp_revoked").await.unwrap();

    assert!(matches!(
        provider.generate(Scope::Read).await,
        Err(ProviderError::InvalidToken { .. })
    ));
}

#[tokio::test]
async fn test_static_token_falls_back_to_environment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "token ghp_from_env"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    unsafe { std::env::set_var("TOKENFED_IT_ENV_FALLBACK", "ghp_from_env") };
    let (provider, _settings) = static_provider(&server, "TOKENFED_IT_ENV_FALLBACK");

    let token = provider.generate(Scope::Write).await.unwrap();
    assert_eq!(token.access_token.expose(), "ghp_from_env");
}
