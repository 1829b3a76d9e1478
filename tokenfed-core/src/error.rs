//! Top-level error types for tokenfed.

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::generator::ProviderError;
use crate::settings::SettingsError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Coarse classification of a failure, for deciding what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials or provider settings have not been configured.
    SetupRequired,
    /// The caller supplied something unusable.
    InvalidInput,
    /// A remote party refused the request.
    Rejected,
    /// A network failure or timeout; retrying may help.
    Transient,
    Internal,
}

/// Top-level error type encompassing all tokenfed errors.
#[derive(Debug, Error)]
pub enum FederationError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl FederationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Credentials(e) => credential_kind(e),
            Self::Settings(SettingsError::InvalidInput { .. }) => ErrorKind::InvalidInput,
            Self::Settings(SettingsError::Store(e)) => store_kind(e),
            Self::Token(e) => token_kind(e),
            Self::Provider(e) => provider_kind(e),
            Self::Store(e) => store_kind(e),
            Self::Config { .. } => ErrorKind::InvalidInput,
        }
    }
}

fn store_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::NotFound { .. } => ErrorKind::SetupRequired,
        _ => ErrorKind::Internal,
    }
}

fn credential_kind(err: &CredentialError) -> ErrorKind {
    match err {
        CredentialError::InvalidInput { .. } => ErrorKind::InvalidInput,
        CredentialError::NotConfigured { .. } => ErrorKind::SetupRequired,
        CredentialError::Store(e) => store_kind(e),
    }
}

fn provider_kind(err: &ProviderError) -> ErrorKind {
    match err {
        ProviderError::NotConfigured { .. } => ErrorKind::SetupRequired,
        ProviderError::Credentials(e) => credential_kind(e),
        ProviderError::Store(e) => store_kind(e),
        ProviderError::HttpClient { .. } => ErrorKind::Internal,
        other => match other.reason() {
            Some(reason) if reason.is_transient() => ErrorKind::Transient,
            _ => ErrorKind::Rejected,
        },
    }
}

fn token_kind(err: &TokenError) -> ErrorKind {
    match err {
        TokenError::NoGeneratorRegistered { .. } => ErrorKind::InvalidInput,
        TokenError::TokenGenerationFailed { source, .. } => provider_kind(source),
        TokenError::LifetimeOutOfRange { .. } => ErrorKind::Rejected,
        TokenError::StorageError(e) => store_kind(e),
        TokenError::Serialization(_) => ErrorKind::Internal,
    }
}
