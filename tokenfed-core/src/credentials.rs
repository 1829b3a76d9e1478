//! Long-lived client credential persistence.
//!
//! [`ClientCredentialManager`] owns the client ID/secret pair of one backend
//! namespace. Keys follow `{namespace}_client_id` / `{namespace}_client_secret`.

use std::sync::Arc;
use thiserror::Error;

use crate::model::ClientCredential;
use crate::store::{Secret, SecretStore, StoreError};

/// Namespace of the StackSpot client pair.
pub const STACKSPOT_NAMESPACE: &str = "stackspot";

/// Error type for client credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A required field was empty.
    #[error("invalid input: {field} must not be empty")]
    InvalidInput { field: &'static str },

    /// No credentials are stored for the namespace.
    #[error("credentials not configured for '{namespace}'")]
    NotConfigured { namespace: String },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Stores and retrieves the client pair for a backend namespace.
#[derive(Clone)]
pub struct ClientCredentialManager {
    store: Arc<dyn SecretStore>,
    namespace: String,
}

impl ClientCredentialManager {
    pub fn new(store: Arc<dyn SecretStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Manager for the StackSpot client pair.
    pub fn stackspot(store: Arc<dyn SecretStore>) -> Self {
        Self::new(store, STACKSPOT_NAMESPACE)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn client_id_key(&self) -> String {
        format!("{}_client_id", self.namespace)
    }

    pub fn client_secret_key(&self) -> String {
        format!("{}_client_secret", self.namespace)
    }

    /// Persist a client pair.
    ///
    /// Nothing is written when either value is empty. If the secret cannot be
    /// written the freshly written client ID is removed again, so readers
    /// never see an ID without its secret.
    pub async fn set_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(), CredentialError> {
        if client_id.trim().is_empty() {
            return Err(CredentialError::InvalidInput { field: "client_id" });
        }
        if client_secret.trim().is_empty() {
            return Err(CredentialError::InvalidInput {
                field: "client_secret",
            });
        }

        let id_key = self.client_id_key();
        self.store.set(&id_key, &Secret::new(client_id)).await?;

        if let Err(e) = self
            .store
            .set(&self.client_secret_key(), &Secret::new(client_secret))
            .await
        {
            tracing::warn!(
                namespace = %self.namespace,
                "Failed to store client secret, rolling back client ID: {}",
                e
            );
            if let Err(rollback) = self.store.delete(&id_key).await {
                tracing::error!(
                    namespace = %self.namespace,
                    "Rollback of client ID failed, store is partially written: {}",
                    rollback
                );
            }
            return Err(e.into());
        }

        tracing::info!(namespace = %self.namespace, "Stored client credentials");
        Ok(())
    }

    /// Load the stored client pair.
    pub async fn get_credentials(&self) -> Result<ClientCredential, CredentialError> {
        let client_id = self.store.get(&self.client_id_key()).await?;
        let client_secret = self.store.get(&self.client_secret_key()).await?;

        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Ok(ClientCredential {
                client_id: id.into_inner(),
                client_secret: secret,
            }),
            _ => Err(CredentialError::NotConfigured {
                namespace: self.namespace.clone(),
            }),
        }
    }

    /// True iff both halves of the pair are stored.
    pub async fn has_credentials(&self) -> bool {
        let id = self.store.exists(&self.client_id_key()).await;
        let secret = self.store.exists(&self.client_secret_key()).await;
        matches!((id, secret), (Ok(true), Ok(true)))
    }

    /// Remove both halves of the pair.
    ///
    /// Both deletions are attempted; the first failure is reported.
    pub async fn delete_credentials(&self) -> Result<(), CredentialError> {
        let id_result = self.store.delete(&self.client_id_key()).await;
        let secret_result = self.store.delete(&self.client_secret_key()).await;

        if id_result.is_err() || secret_result.is_err() {
            tracing::warn!(
                namespace = %self.namespace,
                "Client credentials only partially deleted"
            );
        } else {
            tracing::info!(namespace = %self.namespace, "Deleted client credentials");
        }

        id_result?;
        secret_result?;
        Ok(())
    }
}

impl std::fmt::Debug for ClientCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialManager")
            .field("namespace", &self.namespace)
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
