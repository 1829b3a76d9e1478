//! Out-of-band static tokens.
//!
//! A GitHub personal access token is issued by the user, not by us. The
//! provider only checks that it is still accepted (`GET {api}/user`) and
//! hands it back with a long nominal lifetime so the cache revalidates it
//! once a year at most.

use async_trait::async_trait;
use chrono::Duration;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use super::{build_http_client, join_url, transport_failure};
use crate::config::{FederationConfig, DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_TOKEN_ENV};
use crate::generator::{
    FailureReason, GeneratedToken, ProviderError, TokenGenerator, TokenValidator,
};
use crate::model::Scope;
use crate::settings::{ProviderSettings, GITHUB_TOKEN_KEY};
use crate::store::Secret;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Nominal lifetime of a validated static token.
pub const STATIC_TOKEN_TTL_DAYS: i64 = 365;

/// Token generator and validator for a user-supplied static token.
pub struct StaticTokenProvider {
    settings: ProviderSettings,
    api_url: String,
    env_var: String,
    http: reqwest::Client,
    timeout: std::time::Duration,
}

impl StaticTokenProvider {
    pub fn new(
        settings: ProviderSettings,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            env_var: DEFAULT_GITHUB_TOKEN_ENV.to_string(),
            http: build_http_client(timeout)?,
            timeout,
        })
    }

    pub fn from_config(
        config: &FederationConfig,
        settings: ProviderSettings,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(settings, config.http_timeout())?
            .with_api_url(config.github.api_url.clone())
            .with_env_var(config.github.token_env_var.clone()))
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Environment variable consulted when no token is stored.
    pub fn with_env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    /// The stored token, falling back to the environment.
    pub async fn current_token(&self) -> Result<Option<Secret>, ProviderError> {
        if let Some(token) = self.settings.static_token().await? {
            return Ok(Some(token));
        }

        match std::env::var(&self.env_var) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!(env_var = %self.env_var, "Using static token from environment");
                Ok(Some(Secret::new(value.trim())))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TokenValidator for StaticTokenProvider {
    async fn validate(&self, token: &Secret) -> Result<(), ProviderError> {
        let fail = |reason| ProviderError::InvalidToken { reason };
        let url = join_url(&self.api_url, "user");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", token.expose()))
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| fail(transport_failure(e, self.timeout)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(%status, "Static token rejected");
            return Err(fail(FailureReason::Rejected(status.to_string())));
        }

        Ok(())
    }
}

#[async_trait]
impl TokenGenerator for StaticTokenProvider {
    async fn generate(&self, _scope: Scope) -> Result<GeneratedToken, ProviderError> {
        let token = self
            .current_token()
            .await?
            .ok_or_else(|| ProviderError::NotConfigured {
                setting: format!("{} (or ${})", GITHUB_TOKEN_KEY, self.env_var),
            })?;

        self.validate(&token).await?;

        Ok(GeneratedToken {
            access_token: token,
            expires_in: Duration::days(STATIC_TOKEN_TTL_DAYS),
        })
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("api_url", &self.api_url)
            .field("env_var", &self.env_var)
            .finish()
    }
}
