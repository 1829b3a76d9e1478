//! # tokenfed Core
//!
//! Core library for tokenfed credential and token federation.
//!
//! This crate provides:
//! - A pluggable credential store (OS keyring or process memory)
//! - Client credential and provider settings persistence
//! - A scope- and alias-keyed token cache with expiry
//! - A generator registry and three identity providers: direct
//!   client-credentials, Vault-mediated, and static token
//! - The [`AuthService`] facade the CLI is built on
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokenfed_core::{FederationConfig, FederationContext, Scope};
//!
//! async fn token() -> Result<String, tokenfed_core::FederationError> {
//!     let context = FederationContext::from_config(FederationConfig::default())?;
//!     let token = context.service().get_valid_token(Scope::Execution).await?;
//!     Ok(token.expose().to_string())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod generator;
pub mod model;
pub mod registry;
pub mod service;
pub mod settings;
pub mod store;
pub mod token;
pub mod token_cache;

#[cfg(feature = "oauth")]
pub mod providers;

#[cfg(feature = "oauth")]
pub mod context;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};

pub use config::{
    AuthMode,
    FederationConfig,
    GithubConfig,
    StackspotConfig,
    StorageBackend,
    VaultConfig,
};

pub use credentials::{
    ClientCredentialManager,
    CredentialError,
};

pub use error::{
    ErrorKind,
    FederationError,
};

pub use generator::{
    CredentialExchange,
    FailureReason,
    GeneratedToken,
    ProviderError,
    StoredCredentialsGenerator,
    TokenGenerator,
    TokenValidator,
};

pub use model::{
    ClientCredential,
    ParseScopeError,
    ProviderAlias,
    Scope,
};

pub use registry::GeneratorRegistry;

pub use service::{
    AuthService,
    AuthStatus,
    TokenStatus,
};

pub use settings::{
    ProviderSettings,
    SettingsError,
    VaultSettings,
};

pub use store::{
    Secret,
    SecretStore,
    StoreError,
    MemoryStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use token::{
    TokenError,
    TokenRecord,
};

pub use token_cache::TokenCache;

#[cfg(feature = "oauth")]
pub use providers::{
    ClientCredentialsProvider,
    StaticTokenProvider,
    VaultProvider,
};

#[cfg(feature = "oauth")]
pub use context::FederationContext;
