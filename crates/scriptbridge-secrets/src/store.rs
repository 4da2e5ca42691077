//! Secret names, values, the vault backend trait, and the store facade.

use crate::error::SecretStoreError;
use crate::providers::AzureSecretVault;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, error, info};
use zeroize::Zeroize;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

// ============================================================================
// Core Types
// ============================================================================

/// Validated secret name
///
/// Enforces the Key Vault naming rules so invalid names are rejected
/// locally instead of round-tripping to the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretName(String);

impl SecretName {
    /// Create a new secret name with validation
    ///
    /// # Validation Rules
    /// - Must be 1-127 characters (Key Vault limit)
    /// - Must contain only ASCII alphanumeric characters and hyphens
    pub fn new(name: impl Into<String>) -> Result<Self, SecretStoreError> {
        let name = name.into();

        if name.is_empty() {
            return Err(SecretStoreError::InvalidArgument {
                field: "secret_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if name.len() > 127 {
            return Err(SecretStoreError::InvalidArgument {
                field: "secret_name".to_string(),
                reason: "exceeds 127 character limit".to_string(),
            });
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SecretStoreError::InvalidArgument {
                field: "secret_name".to_string(),
                reason: "only ASCII alphanumeric characters and hyphens allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SecretName {
    type Err = SecretStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Container for secret values
///
/// Secret values are never included in Debug output and the backing
/// buffer is zeroized on drop.
#[derive(Clone)]
pub struct SecretValue {
    inner: String,
}

impl SecretValue {
    /// Create a secret value from a string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Get the secret as a string slice (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Get the secret length without exposing content
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SecretValue {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// ============================================================================
// Vault Backend Trait
// ============================================================================

/// Interface implemented by secret vault backends (Azure, in-memory)
///
/// Each method maps to exactly one vault operation. Backends classify
/// their own failures into [`SecretStoreError`]; the facade adds the
/// configuration guard and argument validation on top.
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// List the names of all secrets, draining pagination eagerly
    async fn list_names(&self) -> Result<Vec<SecretName>, SecretStoreError>;

    /// Get the current value of a named secret
    async fn get(&self, name: &SecretName) -> Result<SecretValue, SecretStoreError>;

    /// Create a secret or update its value if it already exists
    async fn set(&self, name: &SecretName, value: &SecretValue) -> Result<(), SecretStoreError>;

    /// Soft-delete a secret
    ///
    /// Implementations must not return until the delete has reached a
    /// terminal state: a purge or recover issued immediately after this
    /// call returns is guaranteed to observe the deleted secret.
    async fn delete(&self, name: &SecretName) -> Result<(), SecretStoreError>;

    /// Permanently remove a soft-deleted secret
    async fn purge(&self, name: &SecretName) -> Result<(), SecretStoreError>;

    /// Restore a soft-deleted secret to the active state
    ///
    /// Unlike [`delete`](Self::delete), this does not wait for the
    /// recovery to complete; callers must not assume the secret is
    /// immediately readable after this returns.
    async fn recover(&self, name: &SecretName) -> Result<(), SecretStoreError>;
}

// ============================================================================
// SecretStore Facade
// ============================================================================

/// Vault connection state for the facade
enum VaultState {
    Unconfigured,
    Ready(Arc<dyn SecretVault>),
}

/// Secret store facade exposed to the host application
///
/// Operations other than [`initialize`](SecretStore::initialize) fail
/// with [`SecretStoreError::NotInitialized`] until an endpoint has been
/// configured; the guard is checked before any network call is attempted.
pub struct SecretStore {
    state: VaultState,
}

impl SecretStore {
    /// Create a store with no vault configured
    pub fn new() -> Self {
        Self {
            state: VaultState::Unconfigured,
        }
    }

    /// Connect to a Key Vault endpoint using ambient credentials
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty endpoint and `Upstream` if
    /// the client cannot be constructed.
    pub async fn initialize(&mut self, endpoint: &str) -> Result<(), SecretStoreError> {
        if endpoint.trim().is_empty() {
            return Err(SecretStoreError::InvalidArgument {
                field: "endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let vault = AzureSecretVault::connect(endpoint).await?;
        self.state = VaultState::Ready(Arc::new(vault));
        info!(endpoint = %endpoint, "Secret store initialized");
        Ok(())
    }

    /// Attach an already constructed vault backend
    ///
    /// Used by the host's dependency injection and by tests to supply a
    /// substitute vault.
    pub fn initialize_with(&mut self, vault: Arc<dyn SecretVault>) {
        self.state = VaultState::Ready(vault);
    }

    /// Check whether the store has been initialized
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, VaultState::Ready(_))
    }

    fn vault(&self) -> Result<&Arc<dyn SecretVault>, SecretStoreError> {
        match &self.state {
            VaultState::Ready(vault) => Ok(vault),
            VaultState::Unconfigured => Err(SecretStoreError::NotInitialized),
        }
    }

    /// List all secret names in the vault
    pub async fn list(&self) -> Result<Vec<SecretName>, SecretStoreError> {
        let vault = self.vault()?;

        vault.list_names().await.map_err(|e| {
            error!(error = %e, "Failed to list secret names");
            e
        })
    }

    /// Get the current value of a named secret
    pub async fn get(&self, name: &str) -> Result<SecretValue, SecretStoreError> {
        let vault = self.vault()?;
        let name = SecretName::new(name)?;

        debug!(secret_name = %name, "Getting secret");
        vault.get(&name).await.map_err(|e| {
            error!(secret_name = %name, error = %e, "Failed to get secret");
            e
        })
    }

    /// Create a secret or replace its current value
    pub async fn set(&self, name: &str, value: SecretValue) -> Result<(), SecretStoreError> {
        let vault = self.vault()?;
        let name = SecretName::new(name)?;

        debug!(secret_name = %name, "Setting secret");
        vault.set(&name, &value).await.map_err(|e| {
            error!(secret_name = %name, error = %e, "Failed to set secret");
            e
        })
    }

    /// Soft-delete a secret and wait for the delete to become terminal
    ///
    /// The wait trades latency for ordering: once this returns, a purge
    /// or recover of the same name is guaranteed to observe the deleted
    /// state.
    pub async fn delete(&self, name: &str) -> Result<(), SecretStoreError> {
        let vault = self.vault()?;
        let name = SecretName::new(name)?;

        debug!(secret_name = %name, "Deleting secret");
        vault.delete(&name).await.map_err(|e| {
            error!(secret_name = %name, error = %e, "Failed to delete secret");
            e
        })
    }

    /// Permanently remove a soft-deleted secret
    pub async fn purge(&self, name: &str) -> Result<(), SecretStoreError> {
        let vault = self.vault()?;
        let name = SecretName::new(name)?;

        debug!(secret_name = %name, "Purging deleted secret");
        vault.purge(&name).await.map_err(|e| {
            error!(secret_name = %name, error = %e, "Failed to purge secret");
            e
        })
    }

    /// Restore a soft-deleted secret to the active state
    ///
    /// Does not wait for the recovery to complete; callers must not
    /// assume the secret is immediately readable afterwards.
    pub async fn recover(&self, name: &str) -> Result<(), SecretStoreError> {
        let vault = self.vault()?;
        let name = SecretName::new(name)?;

        debug!(secret_name = %name, "Recovering deleted secret");
        vault.recover(&name).await.map_err(|e| {
            error!(secret_name = %name, error = %e, "Failed to recover secret");
            e
        })
    }
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}
