//! Azure Table Storage store implementation.
//!
//! Production Table Storage integration over the account connection
//! string. Entities cross the wire as a serde passthrough type carrying
//! `PartitionKey`/`RowKey` plus a flattened column map; the service owns
//! the filter grammar and the pagination, both of which are forwarded
//! untouched (pages are drained eagerly).

use crate::client::TableStore;
use crate::entity::{TableEntity, TableName};
use crate::error::TableError;
use async_trait::async_trait;
use azure_data_tables::prelude::*;
use azure_storage::prelude::*;
use azure_storage::ConnectionString;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument};

/// Wire shape of an entity: the key pair plus a flattened column map
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEntity {
    #[serde(rename = "PartitionKey")]
    partition_key: String,
    #[serde(rename = "RowKey")]
    row_key: String,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl From<RawEntity> for TableEntity {
    fn from(raw: RawEntity) -> Self {
        // Strip the service bookkeeping columns the wire format adds
        let mut properties = raw.properties;
        properties.remove("odata.etag");
        properties.remove("Timestamp");

        Self {
            partition_key: raw.partition_key,
            row_key: raw.row_key,
            properties,
        }
    }
}

impl From<&TableEntity> for RawEntity {
    fn from(entity: &TableEntity) -> Self {
        Self {
            partition_key: entity.partition_key.clone(),
            row_key: entity.row_key.clone(),
            properties: entity.properties.clone(),
        }
    }
}

/// Azure Table Storage backend over an account connection string
pub struct AzureTableStore {
    service: TableServiceClient,
}

impl AzureTableStore {
    /// Parse the connection string and build the account-level client
    ///
    /// No network call is made until the first operation.
    pub fn connect(connection_string: &str) -> Result<Self, TableError> {
        let parsed = ConnectionString::new(connection_string)
            .map_err(|e| TableError::upstream("initialize", e.to_string()))?;

        let account = parsed.account_name.ok_or_else(|| {
            TableError::invalid("connection_string", "missing AccountName segment")
        })?;
        let key = parsed.account_key.ok_or_else(|| {
            TableError::invalid("connection_string", "missing AccountKey segment")
        })?;

        let credentials = StorageCredentials::access_key(account.to_string(), key.to_string());
        let service = TableServiceClient::new(account.to_string(), credentials);

        info!(account = %account, "Connected to Azure Table Storage");
        Ok(Self { service })
    }

    /// Check whether an SDK error reports an absent entity or table
    fn is_not_found(error: &azure_core::Error) -> bool {
        let message = error.to_string();
        message.contains("404")
            || message.contains("ResourceNotFound")
            || message.contains("EntityNotFound")
            || message.contains("TableNotFound")
    }

    /// Map an Azure SDK error to the store taxonomy
    fn map_error(operation: &str, error: azure_core::Error) -> TableError {
        TableError::upstream(operation, error.to_string())
    }
}

#[async_trait]
impl TableStore for AzureTableStore {
    #[instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<String>, TableError> {
        let mut names = Vec::new();
        let mut stream = self.service.list().into_stream();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(error = %e, "Failed to list tables");
                Self::map_error("list_tables", e)
            })?;
            names.extend(page.tables.into_iter().map(|table| table.name));
        }

        debug!(count = names.len(), "Listed tables");
        Ok(names)
    }

    #[instrument(skip(self, entity))]
    async fn upsert(&self, table: &TableName, entity: &TableEntity) -> Result<(), TableError> {
        let raw = RawEntity::from(entity);
        let entity_client = self
            .service
            .table_client(table.as_str())
            .partition_key_client(&entity.partition_key)
            .entity_client(&entity.row_key);

        entity_client
            .insert_or_replace(&raw)
            .map_err(|e| Self::map_error("upsert", e))?
            .await
            .map_err(|e| {
                error!(table = %table, error = %e, "Upsert failed");
                Self::map_error("upsert", e)
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<(), TableError> {
        let entity_client = self
            .service
            .table_client(table.as_str())
            .partition_key_client(partition_key)
            .entity_client(row_key);

        match entity_client.delete().await {
            Ok(_) => Ok(()),
            Err(e) if Self::is_not_found(&e) => Err(TableError::EntityNotFound {
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            }),
            Err(e) => {
                error!(table = %table, error = %e, "Delete failed");
                Err(Self::map_error("delete", e))
            }
        }
    }

    #[instrument(skip(self))]
    async fn get(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        let entity_client = self
            .service
            .table_client(table.as_str())
            .partition_key_client(partition_key)
            .entity_client(row_key);

        let result = entity_client.get::<RawEntity>().await;

        match result {
            Ok(response) => Ok(Some(response.entity.into())),
            // Point reads absorb not-found into a normal return value
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => {
                error!(table = %table, error = %e, "Get failed");
                Err(Self::map_error("get", e))
            }
        }
    }

    #[instrument(skip(self))]
    async fn query(&self, table: &TableName, filter: &str) -> Result<Vec<TableEntity>, TableError> {
        let table_client = self.service.table_client(table.as_str());

        let mut entities = Vec::new();
        let mut stream = table_client
            .query()
            .filter(filter.to_owned())
            .into_stream::<RawEntity>();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(table = %table, filter, error = %e, "Query failed");
                Self::map_error("query", e)
            })?;
            entities.extend(page.entities.into_iter().map(TableEntity::from));
        }

        debug!(table = %table, count = entities.len(), "Query complete");
        Ok(entities)
    }
}
