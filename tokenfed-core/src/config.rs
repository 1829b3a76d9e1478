//! Federation configuration.
//!
//! [`FederationConfig`] is plain serde data; the CLI loads it from
//! `auth.toml` and every field has a default, so an empty file is valid.
//!
//! ```toml
//! auth_mode = "stackspot_service"
//! http_timeout_secs = 10
//!
//! [stackspot]
//! token_url = "https://idm.stackspot.com/realms/stackspot/protocol/openid-connect/token"
//!
//! [github]
//! api_url = "https://api.github.com"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::Scope;

pub const DEFAULT_SERVICE_NAME: &str = "phengineer";
pub const DEFAULT_STACKSPOT_TOKEN_URL: &str =
    "https://idm.stackspot.com/realms/stackspot/protocol/openid-connect/token";
pub const DEFAULT_VAULT_SECRET_PATH: &str = "secret/data/stackspot";
pub const DEFAULT_VAULT_LOGIN_PATH: &str = "auth/aws/login";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// How the process authenticates, which also decides where secrets live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Interactive user on a workstation; secrets go to the OS keyring.
    #[default]
    StackspotUser,
    /// Stateless service run; secrets stay in process memory.
    StackspotService,
}

impl AuthMode {
    pub fn storage_backend(&self) -> StorageBackend {
        match self {
            Self::StackspotUser => StorageBackend::Keyring,
            Self::StackspotService => StorageBackend::Memory,
        }
    }
}

/// Credential store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Keyring,
    Memory,
}

/// Top-level configuration for the federation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    pub auth_mode: AuthMode,

    /// Overrides the backend implied by `auth_mode`.
    pub storage: Option<StorageBackend>,

    /// Namespace for every entry in the credential store.
    pub service_name: String,

    /// Bound on every outbound identity call.
    pub http_timeout_secs: u64,

    pub stackspot: StackspotConfig,
    pub vault: VaultConfig,
    pub github: GithubConfig,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            auth_mode: AuthMode::default(),
            storage: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            stackspot: StackspotConfig::default(),
            vault: VaultConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl FederationConfig {
    /// The backend chosen for this process.
    pub fn storage_backend(&self) -> StorageBackend {
        self.storage
            .unwrap_or_else(|| self.auth_mode.storage_backend())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Check the values that cannot be defaulted away.
    pub fn validate(&self) -> Result<(), String> {
        if self.service_name.trim().is_empty() {
            return Err("service_name must not be empty".to_string());
        }
        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be greater than zero".to_string());
        }
        url::Url::parse(&self.stackspot.token_url)
            .map_err(|e| format!("invalid stackspot.token_url: {}", e))?;
        url::Url::parse(&self.github.api_url)
            .map_err(|e| format!("invalid github.api_url: {}", e))?;
        Ok(())
    }
}

/// Direct client-credentials exchange settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackspotConfig {
    pub token_url: String,

    /// Scope names sent to the token endpoint. A scope missing from the map
    /// is requested without a scope parameter.
    pub scopes: BTreeMap<Scope, String>,
}

impl Default for StackspotConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_STACKSPOT_TOKEN_URL.to_string(),
            scopes: Scope::ALL
                .iter()
                .map(|scope| (*scope, scope.as_str().to_string()))
                .collect(),
        }
    }
}

/// Secrets-manager mediated exchange settings.
///
/// The Vault address and role are per-installation and live in the
/// credential store; only paths are configured here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub login_path: String,
    pub default_secret_path: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_VAULT_LOGIN_PATH.to_string(),
            default_secret_path: DEFAULT_VAULT_SECRET_PATH.to_string(),
        }
    }
}

/// Static token provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    pub token_env_var: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token_env_var: DEFAULT_GITHUB_TOKEN_ENV.to_string(),
        }
    }
}
