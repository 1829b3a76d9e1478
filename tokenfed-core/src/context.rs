//! Process-wide wiring.
//!
//! [`FederationContext`] is built once at startup from a [`FederationConfig`].
//! It picks the credential store, fills a shared [`GeneratorRegistry`] with
//! the three built-in providers and hands out the cache and facade built on
//! top of them.
//!
//! | alias             | generator                                        |
//! |-------------------|--------------------------------------------------|
//! | `stackspot-api`   | stored client pair + client-credentials exchange |
//! | `hashicorp-vault` | Vault login, secret read, then the same exchange |
//! | `github`          | static token with liveness check                 |

use std::sync::Arc;

use crate::config::FederationConfig;
use crate::credentials::ClientCredentialManager;
use crate::error::FederationError;
use crate::generator::StoredCredentialsGenerator;
use crate::model::ProviderAlias;
use crate::providers::{ClientCredentialsProvider, StaticTokenProvider, VaultProvider};
use crate::registry::GeneratorRegistry;
use crate::service::AuthService;
use crate::settings::ProviderSettings;
use crate::store::{create_store, SecretStore};
use crate::token_cache::TokenCache;

pub struct FederationContext {
    config: FederationConfig,
    store: Arc<dyn SecretStore>,
    registry: Arc<GeneratorRegistry>,
    cache: TokenCache,
    service: AuthService,
}

impl FederationContext {
    /// Build the context, choosing the store from the configured auth mode.
    pub fn from_config(config: FederationConfig) -> Result<Self, FederationError> {
        config
            .validate()
            .map_err(|message| FederationError::Config { message })?;

        let store: Arc<dyn SecretStore> =
            Arc::from(create_store(config.storage_backend(), &config.service_name));
        Self::with_store(config, store)
    }

    /// Build the context over an existing store.
    pub fn with_store(
        config: FederationConfig,
        store: Arc<dyn SecretStore>,
    ) -> Result<Self, FederationError> {
        config
            .validate()
            .map_err(|message| FederationError::Config { message })?;

        let registry = Arc::new(GeneratorRegistry::new());
        let cache = TokenCache::new(store.clone(), registry.clone());
        let settings = ProviderSettings::new(store.clone());

        let direct = Arc::new(ClientCredentialsProvider::from_config(&config));

        registry.register(
            ProviderAlias::stackspot(),
            Arc::new(StoredCredentialsGenerator::new(
                ClientCredentialManager::stackspot(store.clone()),
                direct.clone(),
            )),
        );
        registry.register(
            ProviderAlias::vault(),
            Arc::new(VaultProvider::from_config(
                &config,
                settings.clone(),
                direct.clone(),
            )?),
        );

        let github = Arc::new(StaticTokenProvider::from_config(&config, settings)?);
        registry.register(ProviderAlias::github(), github.clone());

        let service = AuthService::new(store.clone(), cache.clone(), direct).with_validator(github);

        tracing::debug!(
            backend = store.backend_name(),
            auth_mode = ?config.auth_mode,
            aliases = ?registry.aliases(),
            "Federation context ready"
        );

        Ok(Self {
            config,
            store,
            registry,
            cache,
            service,
        })
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<GeneratorRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn service(&self) -> &AuthService {
        &self.service
    }
}

impl std::fmt::Debug for FederationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationContext")
            .field("auth_mode", &self.config.auth_mode)
            .field("backend", &self.store.backend_name())
            .field("registry", &self.registry)
            .finish()
    }
}
