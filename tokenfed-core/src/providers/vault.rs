//! Secrets-manager mediated exchange.
//!
//! [`VaultProvider`] obtains the client pair from HashiCorp Vault instead of
//! local storage:
//!
//! 1. `POST {vault}/v1/auth/aws/login` with `{"role": ...}` yields a session
//!    token (`auth.client_token`).
//! 2. `GET {vault}/v1/{path}` with `X-Vault-Token` returns the KV v2 payload
//!    `data.data.{client_id, client_secret}`.
//! 3. The pair is handed to a [`CredentialExchange`] in memory and dropped.
//!
//! The fetched pair is never written to the credential store.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{build_http_client, join_url, transport_failure};
use crate::config::{FederationConfig, DEFAULT_VAULT_LOGIN_PATH, DEFAULT_VAULT_SECRET_PATH};
use crate::generator::{
    CredentialExchange, FailureReason, GeneratedToken, ProviderError, TokenGenerator,
};
use crate::model::{ClientCredential, Scope};
use crate::settings::{ProviderSettings, VAULT_ROLE_KEY, VAULT_URL_KEY};
use crate::store::Secret;

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct SecretResponse {
    data: SecretEnvelope,
}

#[derive(Deserialize)]
struct SecretEnvelope {
    data: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    client_id: Option<String>,
    client_secret: Option<String>,
}

/// Token generator that sources its client pair from Vault.
pub struct VaultProvider {
    settings: ProviderSettings,
    exchange: Arc<dyn CredentialExchange>,
    http: reqwest::Client,
    login_path: String,
    default_secret_path: String,
    timeout: Duration,
}

impl VaultProvider {
    pub fn new(
        settings: ProviderSettings,
        exchange: Arc<dyn CredentialExchange>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            exchange,
            http: build_http_client(timeout)?,
            login_path: DEFAULT_VAULT_LOGIN_PATH.to_string(),
            default_secret_path: DEFAULT_VAULT_SECRET_PATH.to_string(),
            timeout,
        })
    }

    pub fn from_config(
        config: &FederationConfig,
        settings: ProviderSettings,
        exchange: Arc<dyn CredentialExchange>,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(settings, exchange, config.http_timeout())?
            .with_login_path(config.vault.login_path.clone())
            .with_default_secret_path(config.vault.default_secret_path.clone()))
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Path read when no `vault_stackspot_path` is saved.
    pub fn with_default_secret_path(mut self, path: impl Into<String>) -> Self {
        self.default_secret_path = path.into();
        self
    }

    async fn login(&self, vault_url: &str, role: &str) -> Result<Secret, ProviderError> {
        let fail = |reason| ProviderError::CloudAuthFailed { reason };
        let url = join_url(vault_url, &format!("v1/{}", self.login_path));

        tracing::debug!(%url, %role, "Logging in to Vault");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await
            .map_err(|e| fail(transport_failure(e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(FailureReason::Rejected(format!("{}: {}", status, body.trim()))));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| fail(transport_failure(e, self.timeout)))?;

        match body.auth {
            Some(auth) if !auth.client_token.is_empty() => Ok(Secret::new(auth.client_token)),
            _ => Err(fail(FailureReason::Malformed(
                "login response has no auth.client_token".to_string(),
            ))),
        }
    }

    async fn fetch_credentials(
        &self,
        vault_url: &str,
        session: &Secret,
        path: &str,
    ) -> Result<ClientCredential, ProviderError> {
        let fail = |reason| ProviderError::SecretFetchFailed { reason };
        let url = join_url(vault_url, &format!("v1/{}", path.trim_start_matches('/')));

        tracing::debug!(%url, "Reading client credentials from Vault");

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", session.expose())
            .send()
            .await
            .map_err(|e| fail(transport_failure(e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FailureReason::Rejected(status.to_string())));
        }

        let body: SecretResponse = response
            .json()
            .await
            .map_err(|e| fail(transport_failure(e, self.timeout)))?;

        let payload = body.data.data;
        match (payload.client_id, payload.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Ok(ClientCredential::new(id, secret))
            }
            _ => Err(fail(FailureReason::Malformed(format!(
                "secret at '{}' lacks client_id or client_secret",
                path
            )))),
        }
    }
}

#[async_trait]
impl TokenGenerator for VaultProvider {
    async fn generate(&self, scope: Scope) -> Result<GeneratedToken, ProviderError> {
        let vault_url = self
            .settings
            .vault_url()
            .await?
            .ok_or_else(|| ProviderError::NotConfigured {
                setting: VAULT_URL_KEY.to_string(),
            })?;
        let role = self
            .settings
            .vault_role()
            .await?
            .ok_or_else(|| ProviderError::NotConfigured {
                setting: VAULT_ROLE_KEY.to_string(),
            })?;
        let path = self
            .settings
            .vault_secret_path()
            .await?
            .unwrap_or_else(|| self.default_secret_path.clone());

        let session = self.login(&vault_url, &role).await?;
        let credential = self.fetch_credentials(&vault_url, &session, &path).await?;

        tracing::info!(%scope, "Exchanging Vault-sourced credentials");
        self.exchange.exchange(&credential, scope).await
    }
}

impl std::fmt::Debug for VaultProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultProvider")
            .field("login_path", &self.login_path)
            .field("default_secret_path", &self.default_secret_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
