//! Host configuration for the scriptbridge facades.
//!
//! Settings are loaded from environment variables so hosts can configure
//! the facades without code changes:
//!
//! - `SCRIPTBRIDGE_KEY_VAULT_URL`: Key Vault endpoint
//! - `SCRIPTBRIDGE_SERVICEBUS_CONNECTION_STRING`: Service Bus connection
//! - `SCRIPTBRIDGE_SERVICEBUS_QUEUE`: target queue (required with the
//!   connection string)
//! - `SCRIPTBRIDGE_SERVICEBUS_CONTENT_TYPE`: optional default content type
//! - `SCRIPTBRIDGE_STORAGE_CONNECTION_STRING`: Table Storage connection
//! - `SCRIPTBRIDGE_STORAGE_TABLE`: optional initial table
//! - `SCRIPTBRIDGE_SUBSCRIPTION_ID`: Resource Manager subscription
//!
//! Each facade section is optional; a facade whose variables are absent
//! is simply not configured. Connection strings are redacted in Debug
//! output.

use scriptbridge_queue::{QueueClient, QueueError};
use scriptbridge_resources::{ResourceClient, ResourceError};
use scriptbridge_secrets::{SecretStore, SecretStoreError};
use scriptbridge_tables::{TableClient, TableError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {variable}")]
    MissingEnvVar { variable: String },
}

fn required(variable: &str) -> Result<String, ConfigError> {
    std::env::var(variable).map_err(|_| ConfigError::MissingEnvVar {
        variable: variable.to_string(),
    })
}

fn optional(variable: &str) -> Option<String> {
    std::env::var(variable).ok().filter(|v| !v.is_empty())
}

// ============================================================================
// Per-facade settings
// ============================================================================

/// Key Vault settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyVaultSettings {
    pub vault_url: String,
}

impl KeyVaultSettings {
    /// Build an initialized secret store
    pub async fn connect(&self) -> Result<SecretStore, SecretStoreError> {
        let mut store = SecretStore::new();
        store.initialize(&self.vault_url).await?;
        Ok(store)
    }
}

/// Service Bus settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceBusSettings {
    pub connection_string: String,
    pub queue: String,
    pub content_type: Option<String>,
}

impl ServiceBusSettings {
    /// Build a configured queue client
    pub async fn connect(&self) -> Result<QueueClient, QueueError> {
        let mut client = QueueClient::new();
        client
            .setup(
                &self.connection_string,
                &self.queue,
                self.content_type.as_deref(),
            )
            .await?;
        Ok(client)
    }
}

impl fmt::Debug for ServiceBusSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBusSettings")
            .field("connection_string", &"[REDACTED]")
            .field("queue", &self.queue)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Table Storage settings
#[derive(Clone, Serialize, Deserialize)]
pub struct TableStorageSettings {
    pub connection_string: String,
    pub table: Option<String>,
}

impl TableStorageSettings {
    /// Build a connected table client
    pub async fn connect(&self) -> Result<TableClient, TableError> {
        let mut client = TableClient::new();
        client
            .initialize(&self.connection_string, self.table.as_deref())
            .await?;
        Ok(client)
    }
}

impl fmt::Debug for TableStorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStorageSettings")
            .field("connection_string", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

/// Resource Manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceManagerSettings {
    pub subscription_id: String,
}

impl ResourceManagerSettings {
    /// Build a resource client with the subscription context selected
    pub async fn connect(&self) -> Result<ResourceClient, ResourceError> {
        let mut client = ResourceClient::connect()?;
        client.set_context(&self.subscription_id).await?;
        Ok(client)
    }
}

// ============================================================================
// BridgeConfig
// ============================================================================

/// Host configuration for all facades
///
/// Each section is present only when its environment variables are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub key_vault: Option<KeyVaultSettings>,
    pub service_bus: Option<ServiceBusSettings>,
    pub table_storage: Option<TableStorageSettings>,
    pub resource_manager: Option<ResourceManagerSettings>,
}

impl BridgeConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error naming the missing variable when a facade section
    /// is partially configured (e.g. a Service Bus connection string
    /// without a queue name).
    pub fn from_env() -> Result<Self, ConfigError> {
        let key_vault = optional("SCRIPTBRIDGE_KEY_VAULT_URL")
            .map(|vault_url| KeyVaultSettings { vault_url });

        let service_bus = match optional("SCRIPTBRIDGE_SERVICEBUS_CONNECTION_STRING") {
            Some(connection_string) => Some(ServiceBusSettings {
                connection_string,
                queue: required("SCRIPTBRIDGE_SERVICEBUS_QUEUE")?,
                content_type: optional("SCRIPTBRIDGE_SERVICEBUS_CONTENT_TYPE"),
            }),
            None => None,
        };

        let table_storage = optional("SCRIPTBRIDGE_STORAGE_CONNECTION_STRING").map(
            |connection_string| TableStorageSettings {
                connection_string,
                table: optional("SCRIPTBRIDGE_STORAGE_TABLE"),
            },
        );

        let resource_manager = optional("SCRIPTBRIDGE_SUBSCRIPTION_ID")
            .map(|subscription_id| ResourceManagerSettings { subscription_id });

        let config = Self {
            key_vault,
            service_bus,
            table_storage,
            resource_manager,
        };

        info!(
            key_vault = config.key_vault.is_some(),
            service_bus = config.service_bus.is_some(),
            table_storage = config.table_storage.is_some(),
            resource_manager = config.resource_manager.is_some(),
            "Bridge configuration loaded"
        );
        Ok(config)
    }
}
