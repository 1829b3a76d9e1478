//! Cached token records.
//!
//! This module provides:
//! - [`TokenRecord`] - The cached unit of state: token, scope, alias and absolute expiry
//! - [`TokenError`] - Errors surfaced by the token cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::ProviderError;
use crate::model::{ProviderAlias, Scope};
use crate::store::{Secret, StoreError};

/// Error type for token cache operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Nothing is registered to generate tokens for the alias.
    #[error("no generator registered for alias: {alias}")]
    NoGeneratorRegistered { alias: ProviderAlias },

    /// The generator failed; any previously cached entry was left untouched.
    #[error("failed to generate {scope} token for {alias}: {source}")]
    TokenGenerationFailed {
        scope: Scope,
        alias: ProviderAlias,
        #[source]
        source: ProviderError,
    },

    /// The generator declared a lifetime past what a timestamp can hold.
    /// Nothing was cached.
    #[error("{alias} issued a {scope} token with an out-of-range lifetime of {seconds}s")]
    LifetimeOutOfRange {
        scope: Scope,
        alias: ProviderAlias,
        seconds: i64,
    },

    /// Storage error during token operations.
    #[error("storage error: {0}")]
    StorageError(#[from] StoreError),

    /// A record could not be encoded for storage.
    #[error("token serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cached token.
///
/// Persisted as `{"token", "expires_at", "scope", "alias"}` JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: Secret,
    pub expires_at: DateTime<Utc>,
    pub scope: Scope,
    pub alias: ProviderAlias,
}

impl TokenRecord {
    pub fn new(
        token: Secret,
        expires_at: DateTime<Utc>,
        scope: Scope,
        alias: ProviderAlias,
    ) -> Self {
        Self {
            token,
            expires_at,
            scope,
            alias,
        }
    }

    /// Valid iff the token is non-empty and `now < expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(token: &str, expires_at: DateTime<Utc>) -> TokenRecord {
        TokenRecord::new(
            Secret::new(token),
            expires_at,
            Scope::Execution,
            ProviderAlias::stackspot(),
        )
    }

    #[test]
    fn test_record_validity() {
        let now = Utc::now();

        assert!(record("tok", now + Duration::hours(1)).is_valid_at(now));
        assert!(!record("tok", now - Duration::hours(1)).is_valid_at(now));
        // Expiry is exclusive.
        assert!(!record("tok", now).is_valid_at(now));
        assert!(!record("", now + Duration::hours(1)).is_valid_at(now));
    }

    #[test]
    fn test_record_json_round_trip() {
        let original = record("tok_123", Utc::now() + Duration::seconds(3600));

        let json = original.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["token"], "tok_123");
        assert_eq!(value["scope"], "execution");
        assert_eq!(value["alias"], "stackspot-api");
        assert!(value["expires_at"].is_string());

        let parsed = TokenRecord::from_json(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_record_rejects_garbage() {
        assert!(TokenRecord::from_json("not json").is_err());
        assert!(TokenRecord::from_json(r#"{"token": "t"}"#).is_err());
    }
}
