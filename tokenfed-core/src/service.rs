//! Scope-oriented facade.
//!
//! [`AuthService`] is what the CLI talks to. It ties the client credential
//! manager, the provider settings and the token cache together:
//!
//! - `setup_credentials` / `is_setup` / `teardown` manage the stored identity
//! - `get_valid_token` serves tokens for the primary alias from the stored pair
//! - `get_provider_token` serves any registered alias through the registry
//! - `configure_vault` / `configure_static_token` persist provider settings

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::credentials::{ClientCredentialManager, CredentialError};
use crate::error::FederationError;
use crate::generator::{CredentialExchange, StoredCredentialsGenerator, TokenValidator};
use crate::model::{ProviderAlias, Scope};
use crate::settings::{ProviderSettings, SettingsError};
use crate::store::{Secret, SecretStore};
use crate::token_cache::TokenCache;

/// Snapshot of one cached token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub scope: Scope,
    pub alias: ProviderAlias,
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
}

/// Diagnostic snapshot returned by [`AuthService::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub backend: &'static str,
    pub credentials_configured: bool,
    pub vault_configured: bool,
    pub static_token_configured: bool,
    pub tokens: Vec<TokenStatus>,
}

/// Facade over credentials, provider settings and the token cache.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn SecretStore>,
    credentials: ClientCredentialManager,
    settings: ProviderSettings,
    cache: TokenCache,
    exchange: Arc<dyn CredentialExchange>,
    validator: Option<Arc<dyn TokenValidator>>,
    alias: ProviderAlias,
}

impl AuthService {
    /// Create a service serving the `stackspot-api` alias.
    ///
    /// `cache` must be backed by `store`.
    pub fn new(
        store: Arc<dyn SecretStore>,
        cache: TokenCache,
        exchange: Arc<dyn CredentialExchange>,
    ) -> Self {
        Self {
            credentials: ClientCredentialManager::stackspot(store.clone()),
            settings: ProviderSettings::new(store.clone()),
            store,
            cache,
            exchange,
            validator: None,
            alias: ProviderAlias::stackspot(),
        }
    }

    /// Validator used by [`configure_static_token`](Self::configure_static_token).
    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Alias under which `get_valid_token` caches its tokens.
    pub fn with_alias(mut self, alias: ProviderAlias) -> Self {
        self.alias = alias;
        self
    }

    pub fn alias(&self) -> &ProviderAlias {
        &self.alias
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Persist the client pair. Cached tokens are left alone.
    pub async fn setup_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(), FederationError> {
        self.credentials
            .set_credentials(client_id, client_secret)
            .await?;
        Ok(())
    }

    pub async fn is_setup(&self) -> bool {
        self.credentials.has_credentials().await
    }

    /// A valid token for `scope`, generated from the stored pair on a miss.
    pub async fn get_valid_token(&self, scope: Scope) -> Result<Secret, FederationError> {
        if !self.is_setup().await {
            return Err(CredentialError::NotConfigured {
                namespace: self.credentials.namespace().to_string(),
            }
            .into());
        }

        let generator = StoredCredentialsGenerator::new(self.credentials.clone(), self.exchange.clone());
        Ok(self.cache.get_with(scope, &self.alias, &generator).await?)
    }

    /// A valid token from the generator registered for `alias`.
    pub async fn get_provider_token(
        &self,
        scope: Scope,
        alias: &ProviderAlias,
    ) -> Result<Secret, FederationError> {
        Ok(self.cache.get(scope, alias).await?)
    }

    pub async fn invalidate_token(&self, scope: Scope) -> Result<(), FederationError> {
        self.cache.delete(scope, &self.alias).await?;
        tracing::info!(%scope, alias = %self.alias, "Invalidated token");
        Ok(())
    }

    /// Invalidate every scope of the primary alias.
    ///
    /// All scopes are attempted; the first failure is reported.
    pub async fn invalidate_all_tokens(&self) -> Result<(), FederationError> {
        self.invalidate_alias(&self.alias).await
    }

    async fn invalidate_alias(&self, alias: &ProviderAlias) -> Result<(), FederationError> {
        let mut first_error = None;
        for scope in Scope::ALL {
            if let Err(e) = self.cache.delete(scope, alias).await {
                tracing::warn!(%scope, %alias, "Failed to invalidate token: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => {
                tracing::info!(%alias, "Invalidated all tokens");
                Ok(())
            }
        }
    }

    /// Persist Vault settings and drop tokens minted with the old ones.
    pub async fn configure_vault(
        &self,
        url: &str,
        role: &str,
        path: Option<&str>,
    ) -> Result<(), FederationError> {
        self.settings.save_vault(url, role, path).await?;
        self.invalidate_alias(&ProviderAlias::vault()).await
    }

    /// Validate a static token, then persist it.
    ///
    /// Nothing is written when validation fails.
    pub async fn configure_static_token(&self, token: &str) -> Result<(), FederationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SettingsError::InvalidInput {
                field: "token",
                message: "must not be empty".to_string(),
            }
            .into());
        }

        let validator = self
            .validator
            .as_ref()
            .ok_or_else(|| FederationError::Config {
                message: "no token validator is configured".to_string(),
            })?;
        validator.validate(&Secret::new(token)).await?;

        self.settings.save_static_token(token).await?;
        self.invalidate_alias(&ProviderAlias::github()).await
    }

    /// Forget everything: client pair, provider settings and every cached
    /// token of every known alias.
    ///
    /// All deletions are attempted; the first failure is reported.
    pub async fn teardown(&self) -> Result<(), FederationError> {
        let mut results: Vec<Result<(), FederationError>> = vec![
            self.credentials.delete_credentials().await.map_err(Into::into),
            self.settings.delete_vault().await.map_err(Into::into),
            self.settings.delete_static_token().await.map_err(Into::into),
        ];
        for alias in self.known_aliases() {
            results.push(self.invalidate_alias(&alias).await);
        }

        tracing::info!(backend = self.store.backend_name(), "Teardown complete");
        results.into_iter().collect()
    }

    pub async fn status(&self) -> Result<AuthStatus, FederationError> {
        let now = self.cache.now();
        let mut tokens = Vec::new();
        for alias in self.known_aliases() {
            for scope in Scope::ALL {
                if let Some(record) = self.cache.record(scope, &alias).await? {
                    tokens.push(TokenStatus {
                        valid: record.is_valid_at(now),
                        scope,
                        alias: alias.clone(),
                        expires_at: record.expires_at,
                    });
                }
            }
        }

        Ok(AuthStatus {
            backend: self.store.backend_name(),
            credentials_configured: self.is_setup().await,
            vault_configured: self.settings.vault().await?.is_some(),
            static_token_configured: self.settings.static_token().await?.is_some(),
            tokens,
        })
    }

    /// The primary alias, the built-in provider aliases, then every
    /// registered alias.
    fn known_aliases(&self) -> Vec<ProviderAlias> {
        let mut aliases = vec![self.alias.clone()];
        let builtin = [ProviderAlias::vault(), ProviderAlias::github()];
        for alias in builtin.into_iter().chain(self.cache.registry().aliases()) {
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        aliases
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("alias", &self.alias)
            .field("backend", &self.store.backend_name())
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;
    use crate::generator::{FailureReason, GeneratedToken, ProviderError};
    use crate::model::ClientCredential;
    use crate::registry::GeneratorRegistry;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issues `tok_123`, `tok_124`, ... with a fixed TTL.
    struct SequenceExchange {
        ttl: Duration,
        calls: AtomicUsize,
    }

    impl SequenceExchange {
        fn new(ttl: Duration) -> Self {
            Self {
                ttl,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialExchange for SequenceExchange {
        async fn exchange(
            &self,
            credential: &ClientCredential,
            _scope: Scope,
        ) -> Result<GeneratedToken, ProviderError> {
            assert_eq!(credential.client_id, "client-id");
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeneratedToken::new(format!("tok_{}", 123 + n), self.ttl))
        }
    }

    /// Accepts exactly one token value.
    struct OnlyValidator(&'static str);

    #[async_trait]
    impl TokenValidator for OnlyValidator {
        async fn validate(&self, token: &Secret) -> Result<(), ProviderError> {
            if token.expose() == self.0 {
                Ok(())
            } else {
                Err(ProviderError::InvalidToken {
                    reason: FailureReason::Rejected("401 Unauthorized".to_string()),
                })
            }
        }
    }

    struct Fixture {
        service: AuthService,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        exchange: Arc<SequenceExchange>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let cache = TokenCache::with_clock(
            store.clone(),
            Arc::new(GeneratorRegistry::new()),
            clock.clone(),
        );
        let exchange = Arc::new(SequenceExchange::new(Duration::seconds(3600)));
        let service = AuthService::new(store.clone(), cache, exchange.clone())
            .with_validator(Arc::new(OnlyValidator("ghp_live")));
        Fixture {
            service,
            store,
            clock,
            exchange,
        }
    }

    #[tokio::test]
    async fn test_token_without_setup_is_setup_required() {
        let f = fixture();

        let err = f.service.get_valid_token(Scope::Execution).await.unwrap_err();
        assert!(matches!(
            err,
            FederationError::Credentials(CredentialError::NotConfigured { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::SetupRequired);
        assert_eq!(f.exchange.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_setup_writes_nothing() {
        let f = fixture();

        let err = f.service.setup_credentials("", "secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(f.store.is_empty());
        assert!(!f.service.is_setup().await);
    }

    #[tokio::test]
    async fn test_token_regenerated_after_expiry() {
        let f = fixture();
        f.service
            .setup_credentials("client-id", "client-secret")
            .await
            .unwrap();

        let first = f.service.get_valid_token(Scope::Execution).await.unwrap();
        assert_eq!(first.expose(), "tok_123");

        f.clock.advance(Duration::seconds(1800));
        let cached = f.service.get_valid_token(Scope::Execution).await.unwrap();
        assert_eq!(cached.expose(), "tok_123");
        assert_eq!(f.exchange.calls(), 1);

        f.clock.advance(Duration::seconds(1801));
        let fresh = f.service.get_valid_token(Scope::Execution).await.unwrap();
        assert_eq!(fresh.expose(), "tok_124");
        assert_eq!(f.exchange.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_regenerates_every_scope() {
        let f = fixture();
        f.service
            .setup_credentials("client-id", "client-secret")
            .await
            .unwrap();

        for scope in Scope::ALL {
            f.service.get_valid_token(scope).await.unwrap();
        }
        assert_eq!(f.exchange.calls(), 4);

        f.service.invalidate_all_tokens().await.unwrap();
        for scope in Scope::ALL {
            f.service.get_valid_token(scope).await.unwrap();
        }
        assert_eq!(f.exchange.calls(), 8);
    }

    #[tokio::test]
    async fn test_invalidate_single_scope() {
        let f = fixture();
        f.service
            .setup_credentials("client-id", "client-secret")
            .await
            .unwrap();

        f.service.get_valid_token(Scope::Read).await.unwrap();
        f.service.get_valid_token(Scope::Write).await.unwrap();
        f.service.invalidate_token(Scope::Read).await.unwrap();

        f.service.get_valid_token(Scope::Read).await.unwrap();
        f.service.get_valid_token(Scope::Write).await.unwrap();
        assert_eq!(f.exchange.calls(), 3);
    }

    #[tokio::test]
    async fn test_configure_static_token_validates_first() {
        let f = fixture();

        let err = f
            .service
            .configure_static_token("ghp_revoked")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(f.store.is_empty());

        f.service.configure_static_token("ghp_live").await.unwrap();
        let status = f.service.status().await.unwrap();
        assert!(status.static_token_configured);
    }

    #[tokio::test]
    async fn test_configure_static_token_without_validator() {
        let store = Arc::new(MemoryStore::new());
        let cache = TokenCache::new(store.clone(), Arc::new(GeneratorRegistry::new()));
        let service = AuthService::new(
            store.clone(),
            cache,
            Arc::new(SequenceExchange::new(Duration::seconds(60))),
        );

        let err = service.configure_static_token("ghp_live").await.unwrap_err();
        assert!(matches!(err, FederationError::Config { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_configure_vault_rejects_bad_url() {
        let f = fixture();

        let err = f
            .service
            .configure_vault("vault.example.com", "role", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        f.service
            .configure_vault("https://vault.example.com", "role", None)
            .await
            .unwrap();
        assert!(f.service.status().await.unwrap().vault_configured);
    }

    #[tokio::test]
    async fn test_status_reports_tokens() {
        let f = fixture();
        f.service
            .setup_credentials("client-id", "client-secret")
            .await
            .unwrap();
        f.service.get_valid_token(Scope::Read).await.unwrap();

        let status = f.service.status().await.unwrap();
        assert_eq!(status.backend, "memory");
        assert!(status.credentials_configured);
        assert!(!status.vault_configured);
        assert_eq!(status.tokens.len(), 1);
        assert_eq!(status.tokens[0].scope, Scope::Read);
        assert!(status.tokens[0].valid);

        f.clock.advance(Duration::seconds(3601));
        let status = f.service.status().await.unwrap();
        assert!(!status.tokens[0].valid);
    }

    #[tokio::test]
    async fn test_teardown_forgets_everything() {
        let f = fixture();
        f.service
            .setup_credentials("client-id", "client-secret")
            .await
            .unwrap();
        f.service
            .configure_vault("https://vault.example.com", "role", Some("kv/path"))
            .await
            .unwrap();
        f.service.configure_static_token("ghp_live").await.unwrap();
        f.service.get_valid_token(Scope::Execution).await.unwrap();

        f.service.teardown().await.unwrap();

        assert!(f.store.is_empty());
        assert!(!f.service.is_setup().await);
    }
}
