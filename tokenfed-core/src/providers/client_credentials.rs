//! Direct OAuth2 client-credentials exchange.
//!
//! [`ClientCredentialsProvider`] posts a form-encoded
//! `grant_type=client_credentials` request to a fixed token endpoint and
//! returns the issued access token with its declared lifetime. The client
//! pair is always passed in explicitly; this provider never reads storage.
//! Combine it with a [`StoredCredentialsGenerator`](crate::StoredCredentialsGenerator)
//! to serve tokens from the stored pair.

use async_trait::async_trait;
use chrono::Duration;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, ClientId, ClientSecret,
    ErrorResponse, RequestTokenError, Scope as OAuthScope, TokenResponse, TokenUrl,
};
use std::collections::BTreeMap;

use crate::config::{FederationConfig, StackspotConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::generator::{CredentialExchange, FailureReason, GeneratedToken, ProviderError};
use crate::model::{ClientCredential, Scope};

/// OAuth2 client-credentials provider.
#[derive(Debug, Clone)]
pub struct ClientCredentialsProvider {
    token_url: String,
    scopes: BTreeMap<Scope, String>,
    timeout: std::time::Duration,
}

impl ClientCredentialsProvider {
    /// Create a provider for the given token endpoint with the default
    /// scope mapping and timeout.
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            scopes: StackspotConfig::default().scopes,
            timeout: std::time::Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &FederationConfig) -> Self {
        Self {
            token_url: config.stackspot.token_url.clone(),
            scopes: config.stackspot.scopes.clone(),
            timeout: config.http_timeout(),
        }
    }

    /// Replace the scope mapping.
    pub fn with_scopes(mut self, scopes: BTreeMap<Scope, String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Backend scope string for a scope; empty when unmapped.
    pub fn backend_scope(&self, scope: Scope) -> &str {
        self.scopes.get(&scope).map(String::as_str).unwrap_or("")
    }

    fn create_client(&self, credential: &ClientCredential) -> Result<BasicClient, ProviderError> {
        let invalid = |e: url::ParseError| ProviderError::NotConfigured {
            setting: format!("valid token URL ({}: {})", self.token_url, e),
        };

        // The client-credentials grant never visits the authorization
        // endpoint, but the client type requires one.
        let auth_url = AuthUrl::new(self.token_url.clone()).map_err(invalid)?;
        let token_url = TokenUrl::new(self.token_url.clone()).map_err(invalid)?;

        Ok(BasicClient::new(
            ClientId::new(credential.client_id.clone()),
            Some(ClientSecret::new(
                credential.client_secret.expose().to_string(),
            )),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody))
    }
}

fn classify<RE, TE>(err: RequestTokenError<RE, TE>) -> FailureReason
where
    RE: std::error::Error + 'static,
    TE: ErrorResponse + std::fmt::Display + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => FailureReason::Rejected(response.to_string()),
        RequestTokenError::Request(e) => FailureReason::Transport(e.to_string()),
        RequestTokenError::Parse(e, _) => FailureReason::Malformed(e.to_string()),
        RequestTokenError::Other(message) => FailureReason::Rejected(message),
    }
}

#[async_trait]
impl CredentialExchange for ClientCredentialsProvider {
    async fn exchange(
        &self,
        credential: &ClientCredential,
        scope: Scope,
    ) -> Result<GeneratedToken, ProviderError> {
        let client = self.create_client(credential)?;

        let mut request = client.exchange_client_credentials();
        let backend_scope = self.backend_scope(scope);
        if !backend_scope.is_empty() {
            request = request.add_scope(OAuthScope::new(backend_scope.to_string()));
        }

        tracing::debug!(%scope, token_url = %self.token_url, "Requesting client-credentials token");

        let response = tokio::time::timeout(self.timeout, request.request_async(async_http_client))
            .await
            .map_err(|_| ProviderError::AuthenticationFailed {
                reason: FailureReason::Timeout(self.timeout.as_secs()),
            })?
            .map_err(|e| ProviderError::AuthenticationFailed { reason: classify(e) })?;

        let expires_in = match response.expires_in().map(Duration::from_std) {
            Some(Ok(duration)) => duration,
            Some(Err(_)) | None => {
                tracing::warn!(%scope, "Token response carried no usable expires_in; not caching");
                Duration::zero()
            }
        };

        Ok(GeneratedToken::new(
            response.access_token().secret().to_string(),
            expires_in,
        ))
    }
}
