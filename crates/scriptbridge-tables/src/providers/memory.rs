//! In-memory table store for testing and development.
//!
//! Fully functional implementation of [`TableStore`] backed by nested
//! maps. The filter evaluator supports the equality shape the facade
//! itself emits (`Ident eq 'value'`, optionally joined with `and`); the
//! real service owns the full grammar. Query invocations are counted so
//! tests can observe the one-round-trip-per-key existence check.

use crate::client::TableStore;
use crate::entity::{TableEntity, TableName};
use crate::error::TableError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// One `Ident eq 'value'` comparison
struct Comparison {
    field: String,
    value: String,
}

/// Backing state shared by clones of the store
struct StoreState {
    /// table name -> (partition key, row key) -> entity
    tables: HashMap<String, BTreeMap<(String, String), TableEntity>>,
    query_count: u64,
    calls: u64,
}

/// Thread-safe in-memory table store
#[derive(Clone)]
pub struct InMemoryTableStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryTableStore {
    /// Create a store with no tables
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                tables: HashMap::new(),
                query_count: 0,
                calls: 0,
            })),
        }
    }

    /// Create a table (idempotent)
    pub fn create_table(&self, name: &TableName) {
        self.state
            .write()
            .unwrap()
            .tables
            .entry(name.as_str().to_string())
            .or_default();
    }

    /// Number of query invocations so far
    pub fn query_count(&self) -> u64 {
        self.state.read().unwrap().query_count
    }

    /// Number of store operations invoked so far
    ///
    /// Used by guard tests to verify that precondition failures never
    /// reach the store.
    pub fn call_count(&self) -> u64 {
        self.state.read().unwrap().calls
    }

    /// Parse the equality-only filter subset the in-memory store accepts
    fn parse_filter(filter: &str) -> Result<Vec<Comparison>, TableError> {
        filter
            .split(" and ")
            .map(|clause| {
                let clause = clause.trim();
                let (field, literal) = clause.split_once(" eq ").ok_or_else(|| {
                    TableError::upstream(
                        "query",
                        format!("unsupported filter expression: '{clause}'"),
                    )
                })?;

                let literal = literal.trim();
                let value = literal
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .ok_or_else(|| {
                        TableError::upstream(
                            "query",
                            format!("expected quoted literal in clause: '{clause}'"),
                        )
                    })?;

                Ok(Comparison {
                    field: field.trim().to_string(),
                    value: value.replace("''", "'"),
                })
            })
            .collect()
    }

    fn matches(entity: &TableEntity, comparisons: &[Comparison]) -> bool {
        comparisons.iter().all(|comparison| {
            match comparison.field.as_str() {
                "PartitionKey" => entity.partition_key == comparison.value,
                "RowKey" => entity.row_key == comparison.value,
                field => matches!(
                    entity.property(field),
                    Some(Value::String(s)) if *s == comparison.value
                ),
            }
        })
    }
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn list_tables(&self) -> Result<Vec<String>, TableError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;
        let mut names: Vec<String> = state.tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn upsert(&self, table: &TableName, entity: &TableEntity) -> Result<(), TableError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;
        state
            .tables
            .entry(table.as_str().to_string())
            .or_default()
            .insert(
                (entity.partition_key.clone(), entity.row_key.clone()),
                entity.clone(),
            );
        Ok(())
    }

    async fn delete(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<(), TableError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;

        let removed = state
            .tables
            .get_mut(table.as_str())
            .and_then(|rows| rows.remove(&(partition_key.to_string(), row_key.to_string())));

        match removed {
            Some(_) => Ok(()),
            None => Err(TableError::EntityNotFound {
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            }),
        }
    }

    async fn get(
        &self,
        table: &TableName,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;

        Ok(state
            .tables
            .get(table.as_str())
            .and_then(|rows| rows.get(&(partition_key.to_string(), row_key.to_string())))
            .cloned())
    }

    async fn query(&self, table: &TableName, filter: &str) -> Result<Vec<TableEntity>, TableError> {
        let comparisons = Self::parse_filter(filter)?;

        let mut state = self.state.write().unwrap();
        state.calls += 1;
        state.query_count += 1;

        Ok(state
            .tables
            .get(table.as_str())
            .map(|rows| {
                rows.values()
                    .filter(|entity| Self::matches(entity, &comparisons))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
