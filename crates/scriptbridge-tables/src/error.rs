//! Error types for table operations.

use thiserror::Error;

/// Errors raised by the table facade and its store backends
///
/// The two configuration guards are distinct: `NotConnected` means
/// `initialize()` was never called, `NoTableSelected` means an entity
/// operation was attempted with an account-level connection but no
/// active table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table storage is not connected; call initialize() first")]
    NotConnected,

    #[error("No active table; call set_table() first")]
    NoTableSelected,

    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Entity not found: partition '{partition_key}', row '{row_key}'")]
    EntityNotFound {
        partition_key: String,
        row_key: String,
    },

    #[error("Table storage operation '{operation}' failed: {message}")]
    Upstream { operation: String, message: String },
}

impl TableError {
    /// Build an upstream error with operation context
    pub fn upstream(operation: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Build an invalid-argument error
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if the error is a local precondition failure (no network call
    /// was attempted)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::NoTableSelected | Self::InvalidArgument { .. }
        )
    }
}
