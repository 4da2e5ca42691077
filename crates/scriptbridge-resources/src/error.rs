//! Error types for resource management operations.

use thiserror::Error;

/// Errors raised by the resource client facade and its backends
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("No subscription context; call set_context() first")]
    NoContext,

    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Subscription not found: {subscription_id}")]
    SubscriptionNotFound { subscription_id: String },

    #[error("Resource Manager operation '{operation}' failed: {message}")]
    Upstream { operation: String, message: String },

    #[error("Failed to write '{path}': {message}")]
    Io { path: String, message: String },
}

impl ResourceError {
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
        matches!(self, Self::NoContext | Self::InvalidArgument { .. })
    }
}
