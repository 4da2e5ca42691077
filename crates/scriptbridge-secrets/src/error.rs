//! Error types for secret store operations.

use thiserror::Error;

/// Errors raised by the secret store facade and its vault backends
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret store is not initialized; call initialize() first")]
    NotInitialized,

    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Secret not found: {name}")]
    NotFound { name: String },

    #[error("Key Vault operation '{operation}' failed: {message}")]
    Upstream { operation: String, message: String },
}

impl SecretStoreError {
    /// Build an upstream error with operation context
    pub fn upstream(operation: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Check if the error reports an absent secret
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the error is a local precondition failure (no network call
    /// was attempted)
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::InvalidArgument { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
