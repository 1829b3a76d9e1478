//! OS keyring-backed secret storage implementation.

use async_trait::async_trait;
use keyring::Entry;

use super::{Secret, SecretStore, StoreError};

const AVAILABILITY_KEY: &str = "__availability_check__";
const AVAILABILITY_VALUE: &str = "ok";

/// OS keyring-backed secret store.
///
/// This store uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// # Storage Layout
///
/// Every value is stored as an entry whose service is the fixed namespace
/// given at construction (e.g. `phengineer`) and whose user is the key.
///
/// # Example
///
/// ```rust,ignore
/// use tokenfed_core::store::{KeyringStore, SecretStore, Secret};
///
/// let store = KeyringStore::try_new("phengineer")?;
/// store.set("stackspot_client_id", &Secret::new("my-client")).await?;
/// ```
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    /// Try to create a new keyring store.
    ///
    /// Writes, reads back and deletes a probe entry. Returns
    /// [`StoreError::KeyringUnavailable`] when the platform has no keyring
    /// or the backend does not hand back what was written.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        let unavailable = |message: String| StoreError::KeyringUnavailable { message };

        let entry = Entry::new(service_name, AVAILABILITY_KEY)
            .map_err(|e| unavailable(format!("keyring backend not available: {}", e)))?;
        entry
            .set_password(AVAILABILITY_VALUE)
            .map_err(|e| unavailable(format!("keyring rejected a write: {}", e)))?;

        let read_back = Entry::new(service_name, AVAILABILITY_KEY).and_then(|e| e.get_password());
        let _ = entry.delete_credential();

        match read_back {
            Ok(value) if value == AVAILABILITY_VALUE => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Ok(_) => Err(unavailable("keyring returned a different value".to_string())),
            Err(e) => Err(unavailable(format!("keyring does not retain entries: {}", e))),
        }
    }

    /// The namespace all entries are stored under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn create_entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, key).map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

/// Map a keyring failure on `key` to a store error.
fn store_error(key: &str, action: &str, err: keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoStorageAccess(_) => StoreError::AccessDenied {
            key: key.to_string(),
        },
        keyring::Error::Ambiguous(_) => StoreError::BackendError {
            message: format!("ambiguous keyring entry for {}", key),
        },
        other => StoreError::BackendError {
            message: format!("keyring {} failed for {}: {}", action, key, other),
        },
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        match self.create_entry(key)?.get_password() {
            Ok(password) => Ok(Some(Secret::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_error(key, "read", e)),
        }
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.create_entry(key)?
            .set_password(secret.expose())
            .map_err(|e| store_error(key, "write", e))
    }

    /// Deleting an absent entry succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.create_entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(store_error(key, "delete", e)),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // Platform keyrings offer no enumeration API.
        Err(StoreError::BackendError {
            message: format!(
                "list_keys not supported by keyring backend (requested prefix: {})",
                prefix
            ),
        })
    }

    fn backend_name(&self) -> &'static str {
        "keyring"
    }
}
