//! Store trait and the table client facade.

use crate::entity::{escape_filter_value, TableEntity, TableName};
use crate::error::TableError;
use crate::providers::AzureTableStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// ============================================================================
// Store Trait
// ============================================================================

/// Interface implemented by table store backends (Azure, in-memory)
///
/// The filter grammar passed to [`query`](TableStore::query) is owned by
/// the upstream store and forwarded verbatim.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// List all table names in the account
    async fn list_tables(&self) -> Result<Vec<String>, TableError>;

    /// Create an entity or fully replace the entity with the same
    /// partition and row key
    async fn upsert(&self, table: &TableName, entity: &TableEntity) -> Result<(), TableError>;

    /// Remove an entity
    ///
    /// Deleting a missing entity surfaces the upstream not-found
    /// condition as [`TableError::EntityNotFound`].
    async fn delete(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<(), TableError>;

    /// Point-read an entity
    ///
    /// An upstream not-found is absorbed into `Ok(None)`: key existence
    /// is a routine query here, not an exceptional condition. This is the
    /// one place a not-found is not surfaced as an error; `delete` keeps
    /// the error.
    async fn get(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError>;

    /// Return all entities matching a filter expression, draining
    /// pagination eagerly
    async fn query(&self, table: &TableName, filter: &str) -> Result<Vec<TableEntity>, TableError>;
}

// ============================================================================
// TableClient Facade
// ============================================================================

/// Account-level connection plus the optional active table
struct Connection {
    store: Arc<dyn TableStore>,
    active_table: Option<TableName>,
}

/// Connection state for the facade
enum ConnectionState {
    Disconnected,
    Connected(Connection),
}

/// Table client facade exposed to the host application
///
/// Two guards apply and are checked independently: `list_tables` and
/// `set_table` need only the account-level connection, while entity
/// operations additionally require an active table.
pub struct TableClient {
    state: ConnectionState,
}

impl TableClient {
    /// Create a client with no connection
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    /// Open an account-level connection; optionally select a table
    ///
    /// Supplying a table name is equivalent to calling
    /// [`set_table`](TableClient::set_table) immediately after.
    pub async fn initialize(
        &mut self,
        connection_string: &str,
        table: Option<&str>,
    ) -> Result<(), TableError> {
        if connection_string.trim().is_empty() {
            return Err(TableError::invalid(
                "connection_string",
                "must not be empty",
            ));
        }
        let active_table = table.map(TableName::new).transpose()?;

        let store = AzureTableStore::connect(connection_string)?;
        info!(table = ?active_table, "Table client connected");

        self.state = ConnectionState::Connected(Connection {
            store: Arc::new(store),
            active_table,
        });
        Ok(())
    }

    /// Attach an already constructed store backend
    ///
    /// Used by the host's dependency injection and by tests to supply a
    /// substitute store.
    pub fn initialize_with(&mut self, store: Arc<dyn TableStore>, table: Option<TableName>) {
        self.state = ConnectionState::Connected(Connection {
            store,
            active_table: table,
        });
    }

    /// Switch the active table
    ///
    /// # Errors
    /// Returns `NotConnected` if `initialize` was never called.
    pub fn set_table(&mut self, table: &str) -> Result<(), TableError> {
        let table = TableName::new(table)?;
        match &mut self.state {
            ConnectionState::Connected(connection) => {
                debug!(table = %table, "Active table switched");
                connection.active_table = Some(table);
                Ok(())
            }
            ConnectionState::Disconnected => Err(TableError::NotConnected),
        }
    }

    /// Check whether the account-level connection is open
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Currently selected table, if any
    pub fn active_table(&self) -> Option<&TableName> {
        match &self.state {
            ConnectionState::Connected(connection) => connection.active_table.as_ref(),
            ConnectionState::Disconnected => None,
        }
    }

    /// Account-level guard
    fn store(&self) -> Result<&Arc<dyn TableStore>, TableError> {
        match &self.state {
            ConnectionState::Connected(connection) => Ok(&connection.store),
            ConnectionState::Disconnected => Err(TableError::NotConnected),
        }
    }

    /// Table-level guard; the account-level guard is checked first so the
    /// two failure modes stay distinguishable
    fn active(&self) -> Result<(&Arc<dyn TableStore>, &TableName), TableError> {
        match &self.state {
            ConnectionState::Connected(connection) => match &connection.active_table {
                Some(table) => Ok((&connection.store, table)),
                None => Err(TableError::NoTableSelected),
            },
            ConnectionState::Disconnected => Err(TableError::NotConnected),
        }
    }

    /// List all table names in the account
    ///
    /// Requires only the account-level connection.
    pub async fn list_tables(&self) -> Result<Vec<String>, TableError> {
        let store = self.store()?;

        store.list_tables().await.map_err(|e| {
            error!(error = %e, "Failed to list tables");
            e
        })
    }

    /// Create or fully replace an entity in the active table
    pub async fn upsert(&self, entity: &TableEntity) -> Result<(), TableError> {
        let (store, table) = self.active()?;
        Self::validate_keys(&entity.partition_key, &entity.row_key)?;

        debug!(
            table = %table,
            partition_key = %entity.partition_key,
            row_key = %entity.row_key,
            "Upserting entity"
        );
        store.upsert(table, entity).await.map_err(|e| {
            error!(table = %table, error = %e, "Failed to upsert entity");
            e
        })
    }

    /// Remove an entity from the active table
    pub async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), TableError> {
        let (store, table) = self.active()?;
        Self::validate_keys(partition_key, row_key)?;

        debug!(table = %table, partition_key, row_key, "Deleting entity");
        store.delete(table, partition_key, row_key).await.map_err(|e| {
            error!(table = %table, error = %e, "Failed to delete entity");
            e
        })
    }

    /// Point-read an entity from the active table
    ///
    /// Returns `Ok(None)` when the entity does not exist.
    pub async fn get(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        let (store, table) = self.active()?;
        Self::validate_keys(partition_key, row_key)?;

        store.get(table, partition_key, row_key).await.map_err(|e| {
            error!(table = %table, error = %e, "Failed to get entity");
            e
        })
    }

    /// Return all entities in the active table matching a filter
    /// expression
    ///
    /// The filter grammar is owned by the storage service and forwarded
    /// verbatim, e.g. `RowKey eq 'value'`.
    pub async fn query(&self, filter: &str) -> Result<Vec<TableEntity>, TableError> {
        let (store, table) = self.active()?;
        if filter.trim().is_empty() {
            return Err(TableError::invalid("filter", "must not be empty"));
        }

        store.query(table, filter).await.map_err(|e| {
            error!(table = %table, filter, error = %e, "Failed to query entities");
            e
        })
    }

    /// Keep the row keys that exist in the active table
    ///
    /// Issues one single-key query per candidate, so the cost is one
    /// round trip per key; the result preserves input order.
    pub async fn check_existence(&self, row_keys: &[String]) -> Result<Vec<String>, TableError> {
        let (store, table) = self.active()?;

        let mut existing = Vec::new();
        for row_key in row_keys {
            let filter = format!("RowKey eq '{}'", escape_filter_value(row_key));
            let matches = store.query(table, &filter).await.map_err(|e| {
                error!(table = %table, row_key, error = %e, "Existence check failed");
                e
            })?;
            if !matches.is_empty() {
                existing.push(row_key.clone());
            }
        }

        debug!(
            table = %table,
            candidates = row_keys.len(),
            existing = existing.len(),
            "Existence check complete"
        );
        Ok(existing)
    }

    fn validate_keys(partition_key: &str, row_key: &str) -> Result<(), TableError> {
        if partition_key.is_empty() {
            return Err(TableError::invalid("partition_key", "must not be empty"));
        }
        if row_key.is_empty() {
            return Err(TableError::invalid("row_key", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for TableClient {
    fn default() -> Self {
        Self::new()
    }
}
