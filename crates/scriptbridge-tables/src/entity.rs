//! Table names, entities, and filter helpers.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;

/// Validated table name
///
/// Enforces the storage naming rules: 3-63 ASCII alphanumeric characters
/// starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    /// Create new table name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, TableError> {
        let name = name.into();

        if name.len() < 3 || name.len() > 63 {
            return Err(TableError::invalid("table_name", "must be 3-63 characters"));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TableError::invalid(
                "table_name",
                "only ASCII alphanumeric characters allowed",
            ));
        }

        if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(TableError::invalid(
                "table_name",
                "must start with a letter",
            ));
        }

        Ok(Self(name))
    }

    /// Get table name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An entity in the keyed store
///
/// Identified by its partition and row key pair; all other columns live
/// in the property map. Upserts replace the entity wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub properties: Map<String, Value>,
}

impl TableEntity {
    /// Create an entity with no extra columns
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: Map::new(),
        }
    }

    /// Attach a column value
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Read a column value
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Escape a value for interpolation into an OData filter string literal
///
/// The filter grammar is owned by the storage service; the only rewriting
/// done locally is doubling single quotes so key values cannot terminate
/// the literal early.
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\'', "''")
}
