//! Error types for queue operations.

use thiserror::Error;

/// Errors raised by the queue facade and its transports
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue client is not configured; call setup() first")]
    NotConfigured,

    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Message at position {index} does not fit in an empty transport batch")]
    MessageTooLarge { index: usize },

    #[error("Service Bus operation '{operation}' failed: {message}")]
    Upstream { operation: String, message: String },
}

impl QueueError {
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
        matches!(self, Self::NotConfigured | Self::InvalidArgument { .. })
    }
}
