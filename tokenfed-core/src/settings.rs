//! Persisted provider settings.
//!
//! Per-installation values the mediated and static providers need live in
//! the credential store next to the client pair:
//!
//! | key                    | meaning                                  |
//! |------------------------|------------------------------------------|
//! | `vault_url`            | Vault base address                       |
//! | `vault_aws_role`       | role used for the cloud-identity login   |
//! | `vault_stackspot_path` | KV path of the client pair (optional)    |
//! | `github_token`         | static token, validated before saving    |

use std::sync::Arc;
use thiserror::Error;

use crate::store::{Secret, SecretStore, StoreError};

pub const VAULT_URL_KEY: &str = "vault_url";
pub const VAULT_ROLE_KEY: &str = "vault_aws_role";
pub const VAULT_PATH_KEY: &str = "vault_stackspot_path";
pub const GITHUB_TOKEN_KEY: &str = "github_token";

/// Error type for provider settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl SettingsError {
    fn empty(field: &'static str) -> Self {
        Self::InvalidInput {
            field,
            message: "must not be empty".to_string(),
        }
    }
}

/// Vault connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub url: String,
    pub role: String,
    pub secret_path: Option<String>,
}

impl VaultSettings {
    /// The configured secret path, or `default` when none was saved.
    pub fn secret_path_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.secret_path.as_deref().unwrap_or(default)
    }
}

/// Reads and writes provider settings in the credential store.
#[derive(Clone)]
pub struct ProviderSettings {
    store: Arc<dyn SecretStore>,
}

impl ProviderSettings {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(key)
            .await?
            .map(Secret::into_inner)
            .filter(|value| !value.trim().is_empty()))
    }

    /// Persist Vault settings.
    ///
    /// `url` must be an absolute http(s) URL and `role` non-empty. A `None`
    /// or blank `path` clears any previously saved path.
    pub async fn save_vault(
        &self,
        url: &str,
        role: &str,
        path: Option<&str>,
    ) -> Result<(), SettingsError> {
        let url = url.trim();
        let role = role.trim();
        if url.is_empty() {
            return Err(SettingsError::empty("vault url"));
        }
        let parsed = url::Url::parse(url).map_err(|e| SettingsError::InvalidInput {
            field: "vault url",
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidInput {
                field: "vault url",
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if role.is_empty() {
            return Err(SettingsError::empty("vault role"));
        }

        self.store.set(VAULT_URL_KEY, &Secret::new(url)).await?;
        self.store.set(VAULT_ROLE_KEY, &Secret::new(role)).await?;
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => self.store.set(VAULT_PATH_KEY, &Secret::new(path)).await?,
            None => self.store.delete(VAULT_PATH_KEY).await?,
        }

        tracing::info!(vault_url = %url, "Saved Vault settings");
        Ok(())
    }

    pub async fn vault_url(&self) -> Result<Option<String>, StoreError> {
        self.read(VAULT_URL_KEY).await
    }

    pub async fn vault_role(&self) -> Result<Option<String>, StoreError> {
        self.read(VAULT_ROLE_KEY).await
    }

    pub async fn vault_secret_path(&self) -> Result<Option<String>, StoreError> {
        self.read(VAULT_PATH_KEY).await
    }

    /// Vault settings, if both URL and role are saved.
    pub async fn vault(&self) -> Result<Option<VaultSettings>, StoreError> {
        let (Some(url), Some(role)) = (self.vault_url().await?, self.vault_role().await?) else {
            return Ok(None);
        };
        Ok(Some(VaultSettings {
            url,
            role,
            secret_path: self.vault_secret_path().await?,
        }))
    }

    /// Remove every Vault setting. All deletions are attempted.
    pub async fn delete_vault(&self) -> Result<(), StoreError> {
        let results = [
            self.store.delete(VAULT_URL_KEY).await,
            self.store.delete(VAULT_ROLE_KEY).await,
            self.store.delete(VAULT_PATH_KEY).await,
        ];
        results.into_iter().collect()
    }

    /// Persist a static token. Liveness is checked by the caller.
    pub async fn save_static_token(&self, token: &str) -> Result<(), SettingsError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SettingsError::empty("token"));
        }
        self.store.set(GITHUB_TOKEN_KEY, &Secret::new(token)).await?;
        tracing::info!("Saved static token");
        Ok(())
    }

    pub async fn static_token(&self) -> Result<Option<Secret>, StoreError> {
        Ok(self.read(GITHUB_TOKEN_KEY).await?.map(Secret::new))
    }

    pub async fn delete_static_token(&self) -> Result<(), StoreError> {
        self.store.delete(GITHUB_TOKEN_KEY).await
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
