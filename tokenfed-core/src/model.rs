//! Domain model types for tokenfed.
//!
//! This module defines the core types used throughout the crate:
//! - [`Scope`] - Capability tag a token is issued for
//! - [`ProviderAlias`] - Identifier of a configured identity backend
//! - [`ClientCredential`] - Long-lived client ID/secret pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::store::Secret;

/// Capability tag constraining what an issued token may be used for.
///
/// A token issued for one scope is never handed out for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Execution,
    Creation,
    Read,
    Write,
}

impl Scope {
    /// Every known scope, in a stable order.
    pub const ALL: [Scope; 4] = [Scope::Execution, Scope::Creation, Scope::Read, Scope::Write];

    /// Get the scope as a string for storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::Creation => "creation",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Scope`] from a string.
#[derive(Debug, thiserror::Error)]
#[error("unknown scope '{0}' (expected one of: execution, creation, read, write)")]
pub struct ParseScopeError(String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "execution" => Ok(Self::Execution),
            "creation" => Ok(Self::Creation),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(ParseScopeError(s.to_string())),
        }
    }
}

/// Identifier for a configured identity backend (e.g. "stackspot-api").
///
/// Aliases are stable strings: they are part of token cache keys and the
/// lookup key of the generator registry. They are normalized to lowercase.
///
/// # Examples
///
/// ```
/// use tokenfed_core::ProviderAlias;
///
/// let alias = ProviderAlias::new("StackSpot-API");
/// assert_eq!(alias, ProviderAlias::stackspot());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderAlias(String);

impl ProviderAlias {
    pub const STACKSPOT: &'static str = "stackspot-api";
    pub const VAULT: &'static str = "hashicorp-vault";
    pub const GITHUB: &'static str = "github";

    /// Create a new provider alias.
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into().to_lowercase())
    }

    /// Direct client-credentials exchange against StackSpot.
    pub fn stackspot() -> Self {
        Self::new(Self::STACKSPOT)
    }

    /// StackSpot exchange with credentials fetched from HashiCorp Vault.
    pub fn vault() -> Self {
        Self::new(Self::VAULT)
    }

    /// Static GitHub personal access token.
    pub fn github() -> Self {
        Self::new(Self::GITHUB)
    }

    /// Get the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderAlias {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderAlias {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A client ID/secret pair used to bootstrap token generation.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredential {
    pub client_id: String,
    pub client_secret: Secret,
}

impl ClientCredential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
        }
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .finish()
    }
}
