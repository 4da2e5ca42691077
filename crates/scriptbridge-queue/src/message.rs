//! Message types for queue operations including core domain identifiers.

use crate::error::QueueError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, QueueError> {
        let name = name.into();

        // Validate length
        if name.is_empty() || name.len() > 260 {
            return Err(QueueError::invalid(
                "queue_name",
                "must be 1-260 characters",
            ));
        }

        // Validate characters (ASCII alphanumeric, hyphens, underscores)
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(QueueError::invalid(
                "queue_name",
                "only ASCII alphanumeric, hyphens, and underscores allowed",
            ));
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(QueueError::invalid(
                "queue_name",
                "no leading/trailing hyphens or consecutive hyphens",
            ));
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier for grouping related messages for ordered processing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create new session ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, QueueError> {
        let id = id.into();

        if id.is_empty() {
            return Err(QueueError::invalid("session_id", "must not be empty"));
        }

        if id.len() > 128 {
            return Err(QueueError::invalid("session_id", "maximum 128 characters"));
        }

        // Validate ASCII printable characters only
        if !id.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(QueueError::invalid(
                "session_id",
                "only ASCII printable characters allowed",
            ));
        }

        Ok(Self(id))
    }

    /// Get session ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message handed to the transport for sending
///
/// Carries the body plus the metadata the facade stamps at send time:
/// content type, optional session id, and a snapshot of the property bag.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub session_id: Option<SessionId>,
    pub properties: HashMap<String, String>,
}

impl OutboundMessage {
    /// Create new message with body
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
            session_id: None,
            properties: HashMap::new(),
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the session ID for ordered processing
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attach a metadata property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A message received from the queue with its acknowledgement receipt
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub properties: HashMap<String, String>,
    pub session_id: Option<SessionId>,
    pub receipt: ReceiptHandle,
}

/// Opaque token for acknowledging a received message
///
/// The handle carries the key of the logical receiver that produced the
/// message; completion is routed back to that receiver. Completing the
/// same message twice, or through a different receiver, is
/// upstream-defined behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHandle {
    handle: String,
    receiver_key: String,
}

impl ReceiptHandle {
    /// Create new receipt handle
    pub fn new(handle: impl Into<String>, receiver_key: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            receiver_key: receiver_key.into(),
        }
    }

    /// Get handle string
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Get the key of the receiver that produced the message
    pub fn receiver_key(&self) -> &str {
        &self.receiver_key
    }
}
