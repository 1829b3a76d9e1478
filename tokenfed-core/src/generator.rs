//! Token generation contracts.
//!
//! This module provides:
//! - [`TokenGenerator`] - Produces a fresh token for a scope; one per provider alias
//! - [`CredentialExchange`] - Exchanges an explicit client pair for a token
//! - [`TokenValidator`] - Checks that an out-of-band token is still live
//! - [`StoredCredentialsGenerator`] - Reads the stored client pair, then exchanges it
//!
//! Concrete identity providers live in [`crate::providers`].

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

use crate::credentials::{ClientCredentialManager, CredentialError};
use crate::model::{ClientCredential, Scope};
use crate::store::{Secret, StoreError};

/// Why a provider call failed, independent of which step failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The remote side answered and said no.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// No answer arrived within the configured timeout, in seconds.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// The answer could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FailureReason {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// Error type for identity provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A setting the provider needs has not been configured.
    #[error("provider not configured: {setting} is missing")]
    NotConfigured { setting: String },

    /// The token endpoint refused or failed the client-credentials exchange.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: FailureReason },

    /// The cloud-identity login to the secrets manager failed.
    #[error("cloud identity login failed: {reason}")]
    CloudAuthFailed { reason: FailureReason },

    /// The secret holding the client pair could not be read.
    #[error("secret fetch failed: {reason}")]
    SecretFetchFailed { reason: FailureReason },

    /// A static token did not pass liveness validation.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: FailureReason },

    /// The HTTP client could not be constructed.
    #[error("http client error: {message}")]
    HttpClient { message: String },

    #[error("credential error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ProviderError {
    /// The failure detail of a remote call, if this error came from one.
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            Self::AuthenticationFailed { reason }
            | Self::CloudAuthFailed { reason }
            | Self::SecretFetchFailed { reason }
            | Self::InvalidToken { reason } => Some(reason),
            _ => None,
        }
    }
}

/// A freshly issued token and how long it lives.
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    pub access_token: Secret,
    pub expires_in: Duration,
}

impl GeneratedToken {
    pub fn new(access_token: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            access_token: Secret::new(access_token),
            expires_in,
        }
    }
}

/// Produces a fresh token for a scope.
///
/// Registered per provider alias in the [`GeneratorRegistry`](crate::GeneratorRegistry)
/// and invoked by the [`TokenCache`](crate::TokenCache) on a miss.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    async fn generate(&self, scope: Scope) -> Result<GeneratedToken, ProviderError>;
}

/// Exchanges an explicit client pair for a token.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(
        &self,
        credential: &ClientCredential,
        scope: Scope,
    ) -> Result<GeneratedToken, ProviderError>;
}

/// Checks that a token obtained out-of-band is still accepted.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &Secret) -> Result<(), ProviderError>;
}

/// Reads the stored client pair, then delegates to a [`CredentialExchange`].
#[derive(Clone)]
pub struct StoredCredentialsGenerator {
    credentials: ClientCredentialManager,
    exchange: Arc<dyn CredentialExchange>,
}

impl StoredCredentialsGenerator {
    pub fn new(credentials: ClientCredentialManager, exchange: Arc<dyn CredentialExchange>) -> Self {
        Self {
            credentials,
            exchange,
        }
    }
}

#[async_trait]
impl TokenGenerator for StoredCredentialsGenerator {
    async fn generate(&self, scope: Scope) -> Result<GeneratedToken, ProviderError> {
        let credential = self.credentials.get_credentials().await?;
        self.exchange.exchange(&credential, scope).await
    }
}
