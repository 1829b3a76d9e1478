//! Scope- and alias-keyed token cache.
//!
//! [`TokenCache`] owns the lifecycle of [`TokenRecord`]s: it decides whether a
//! stored record is still usable, regenerates through the
//! [`GeneratorRegistry`] when it is not, and persists the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokenfed_core::{GeneratorRegistry, MemoryStore, ProviderAlias, Scope, TokenCache};
//!
//! let registry = Arc::new(GeneratorRegistry::new());
//! registry.register(ProviderAlias::github(), Arc::new(github_provider));
//!
//! let cache = TokenCache::new(Arc::new(MemoryStore::new()), registry);
//! let token = cache.get(Scope::Read, &ProviderAlias::github()).await?;
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::generator::TokenGenerator;
use crate::model::{ProviderAlias, Scope};
use crate::registry::GeneratorRegistry;
use crate::store::{Secret, SecretStore};
use crate::token::{TokenError, TokenRecord};

/// Token cache over a [`SecretStore`].
///
/// Cheap to clone; clones share the store, registry and clock.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn SecretStore>,
    registry: Arc<GeneratorRegistry>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create a cache using the wall clock.
    pub fn new(store: Arc<dyn SecretStore>, registry: Arc<GeneratorRegistry>) -> Self {
        Self::with_clock(store, registry, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn SecretStore>,
        registry: Arc<GeneratorRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    /// Storage key for a scope/alias pair.
    pub fn cache_key(scope: Scope, alias: &ProviderAlias) -> String {
        format!("token_{}_{}", scope.as_str(), alias.as_str())
    }

    pub fn registry(&self) -> &Arc<GeneratorRegistry> {
        &self.registry
    }

    /// Current time as seen by expiry checks.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a valid token, regenerating through the registered generator on a
    /// miss, a corrupt entry or an expired entry.
    pub async fn get(&self, scope: Scope, alias: &ProviderAlias) -> Result<Secret, TokenError> {
        if let Some(token) = self.cached_token(scope, alias).await {
            return Ok(token);
        }

        let generator = self
            .registry
            .get(alias)
            .ok_or_else(|| TokenError::NoGeneratorRegistered {
                alias: alias.clone(),
            })?;

        self.regenerate(scope, alias, generator.as_ref()).await
    }

    /// Like [`get`](Self::get), but regenerates with the given generator
    /// instead of the registered one.
    pub async fn get_with(
        &self,
        scope: Scope,
        alias: &ProviderAlias,
        generator: &dyn TokenGenerator,
    ) -> Result<Secret, TokenError> {
        if let Some(token) = self.cached_token(scope, alias).await {
            return Ok(token);
        }

        self.regenerate(scope, alias, generator).await
    }

    /// The stored record, without judging expiry.
    ///
    /// Corrupt entries read as `None`.
    pub async fn record(
        &self,
        scope: Scope,
        alias: &ProviderAlias,
    ) -> Result<Option<TokenRecord>, TokenError> {
        let key = Self::cache_key(scope, alias);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        Ok(TokenRecord::from_json(raw.expose()).ok())
    }

    /// Remove the cached entry for a scope/alias pair.
    pub async fn delete(&self, scope: Scope, alias: &ProviderAlias) -> Result<(), TokenError> {
        let key = Self::cache_key(scope, alias);
        self.store.delete(&key).await?;
        tracing::debug!(%scope, %alias, "Deleted cached token");
        Ok(())
    }

    /// Whether an entry exists, valid or not.
    pub async fn exists(&self, scope: Scope, alias: &ProviderAlias) -> Result<bool, TokenError> {
        let key = Self::cache_key(scope, alias);
        Ok(self.store.exists(&key).await?)
    }

    async fn cached_token(&self, scope: Scope, alias: &ProviderAlias) -> Option<Secret> {
        let key = Self::cache_key(scope, alias);

        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%scope, %alias, "Failed to read cached token, regenerating: {}", e);
                return None;
            }
        };

        let record = match TokenRecord::from_json(raw.expose()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%scope, %alias, "Discarding corrupt cached token: {}", e);
                return None;
            }
        };

        if record.is_valid_at(self.clock.now()) {
            tracing::debug!(%scope, %alias, "Using cached token");
            Some(record.token)
        } else {
            tracing::info!(%scope, %alias, "Cached token expired");
            None
        }
    }

    async fn regenerate(
        &self,
        scope: Scope,
        alias: &ProviderAlias,
        generator: &dyn TokenGenerator,
    ) -> Result<Secret, TokenError> {
        let generated = generator.generate(scope).await.map_err(|source| {
            tracing::error!(%scope, %alias, "Token generation failed: {}", source);
            TokenError::TokenGenerationFailed {
                scope,
                alias: alias.clone(),
                source,
            }
        })?;

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(generated.expires_in)
            .ok_or_else(|| {
                tracing::error!(%scope, %alias, "Generated token lifetime is out of range");
                TokenError::LifetimeOutOfRange {
                    scope,
                    alias: alias.clone(),
                    seconds: generated.expires_in.num_seconds(),
                }
            })?;
        let record = TokenRecord::new(generated.access_token, expires_at, scope, alias.clone());

        let key = Self::cache_key(scope, alias);
        self.store.set(&key, &Secret::new(record.to_json()?)).await?;

        tracing::info!(%scope, %alias, %expires_at, "Generated new token");

        Ok(record.token)
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("backend", &self.store.backend_name())
            .field("registry", &self.registry)
            .finish()
    }
}
