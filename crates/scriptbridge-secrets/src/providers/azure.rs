//! Azure Key Vault vault backend.
//!
//! Production Key Vault integration using the Azure SDK with ambient
//! credential resolution (managed identity, environment, or developer
//! tooling, whichever `DefaultAzureCredential` finds first).

use crate::error::SecretStoreError;
use crate::store::{SecretName, SecretValue, SecretVault};
use async_trait::async_trait;
use azure_identity::DefaultAzureCredential;
use azure_security_keyvault_secrets::models::SetSecretParameters;
use azure_security_keyvault_secrets::{ResourceExt, SecretClient};
use futures::TryStreamExt;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// How often the deleted-secret endpoint is polled while waiting for a
/// delete to become terminal, and how many polls are attempted before
/// giving up.
const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DELETE_POLL_ATTEMPTS: u32 = 30;

/// Azure Key Vault backend with ambient credential authentication
pub struct AzureSecretVault {
    client: SecretClient,
    vault_url: String,
}

impl AzureSecretVault {
    /// Connect to a Key Vault endpoint
    ///
    /// # Errors
    /// Returns `Upstream` if credential resolution or client construction
    /// fails; no network call is made until the first operation.
    #[instrument]
    pub async fn connect(endpoint: &str) -> Result<Self, SecretStoreError> {
        let credential = DefaultAzureCredential::new()
            .map_err(|e| SecretStoreError::upstream("initialize", format!("credential: {e}")))?;

        let client = SecretClient::new(endpoint, credential, None)
            .map_err(|e| SecretStoreError::upstream("initialize", format!("client: {e}")))?;

        info!(vault_url = %endpoint, "Connected to Azure Key Vault");

        Ok(Self {
            client,
            vault_url: endpoint.to_string(),
        })
    }

    /// Map an Azure SDK error to the store taxonomy
    fn map_error(name: &SecretName, operation: &str, error: azure_core::Error) -> SecretStoreError {
        let message = error.to_string();

        if message.contains("404")
            || message.contains("NotFound")
            || message.contains("not found")
        {
            SecretStoreError::NotFound {
                name: name.to_string(),
            }
        } else {
            SecretStoreError::upstream(operation, message)
        }
    }

    /// Poll the deleted-secret endpoint until the delete is terminal
    ///
    /// Key Vault reports the deleted object only once the delete has
    /// settled, so a successful read here is the happens-before point a
    /// following purge or recover relies on.
    async fn wait_for_deleted(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        for attempt in 1..=DELETE_POLL_ATTEMPTS {
            match self.client.get_deleted_secret(name.as_str(), None).await {
                Ok(_) => {
                    debug!(secret_name = %name, attempt, "Delete reached terminal state");
                    return Ok(());
                }
                Err(e) => {
                    let message = e.to_string();
                    if message.contains("404") || message.contains("NotFound") {
                        debug!(secret_name = %name, attempt, "Delete still in progress");
                        tokio::time::sleep(DELETE_POLL_INTERVAL).await;
                    } else {
                        return Err(Self::map_error(name, "delete", e));
                    }
                }
            }
        }

        Err(SecretStoreError::upstream(
            "delete",
            format!(
                "delete of '{}' did not reach a terminal state after {} polls",
                name, DELETE_POLL_ATTEMPTS
            ),
        ))
    }
}

#[async_trait]
impl SecretVault for AzureSecretVault {
    #[instrument(skip(self))]
    async fn list_names(&self) -> Result<Vec<SecretName>, SecretStoreError> {
        debug!(vault_url = %self.vault_url, "Listing secret names");

        let mut names = Vec::new();
        let mut pager = self
            .client
            .list_secret_properties(None)
            .map_err(|e| SecretStoreError::upstream("list", e.to_string()))?;

        while let Some(properties) = pager
            .try_next()
            .await
            .map_err(|e| SecretStoreError::upstream("list", e.to_string()))?
        {
            let resource_id = properties
                .resource_id()
                .map_err(|e| SecretStoreError::upstream("list", e.to_string()))?;
            if let Ok(name) = SecretName::new(resource_id.name) {
                names.push(name);
            }
        }

        info!(count = names.len(), "Listed secret names");
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn get(&self, name: &SecretName) -> Result<SecretValue, SecretStoreError> {
        let secret = self
            .client
            .get_secret(name.as_str(), "", None)
            .await
            .map_err(|e| {
                error!(secret_name = %name, error = %e, "Failed to get secret");
                Self::map_error(name, "get", e)
            })?
            .into_body()
            .await
            .map_err(|e| SecretStoreError::upstream("get", e.to_string()))?;

        let value = secret.value.ok_or_else(|| {
            SecretStoreError::upstream("get", format!("secret '{}' has no value", name))
        })?;

        Ok(SecretValue::new(value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, name: &SecretName, value: &SecretValue) -> Result<(), SecretStoreError> {
        let parameters = SetSecretParameters {
            value: Some(value.expose_secret().to_string()),
            ..Default::default()
        };

        let body = parameters
            .try_into()
            .map_err(|e: azure_core::Error| SecretStoreError::upstream("set", e.to_string()))?;

        self.client
            .set_secret(name.as_str(), body, None)
            .await
            .map_err(|e| {
                error!(secret_name = %name, error = %e, "Failed to set secret");
                Self::map_error(name, "set", e)
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        self.client
            .delete_secret(name.as_str(), None)
            .await
            .map_err(|e| {
                error!(secret_name = %name, error = %e, "Failed to delete secret");
                Self::map_error(name, "delete", e)
            })?;

        self.wait_for_deleted(name).await
    }

    #[instrument(skip(self))]
    async fn purge(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        self.client
            .purge_deleted_secret(name.as_str(), None)
            .await
            .map_err(|e| {
                error!(secret_name = %name, error = %e, "Failed to purge secret");
                Self::map_error(name, "purge", e)
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recover(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        // Deliberately does not wait for the recovered secret to become
        // readable; see the trait contract.
        self.client
            .recover_deleted_secret(name.as_str(), None)
            .await
            .map_err(|e| {
                error!(secret_name = %name, error = %e, "Failed to recover secret");
                Self::map_error(name, "recover", e)
            })?;

        Ok(())
    }
}
