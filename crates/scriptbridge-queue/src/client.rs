//! Transport trait and the queue client facade.

use crate::error::QueueError;
use crate::message::{OutboundMessage, QueueName, ReceiptHandle, ReceivedMessage, SessionId};
use crate::providers::AzureQueueTransport;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// ============================================================================
// Transport Trait
// ============================================================================

/// Interface implemented by queue transports (Azure Service Bus, in-memory)
///
/// Each method maps to one physical transport interaction. The batch
/// splitting loop lives in the facade; the transport only decides how
/// much of a message run fits into one physical batch.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Send a single message
    async fn send(&self, queue: &QueueName, message: OutboundMessage) -> Result<(), QueueError>;

    /// Send a single message that becomes visible at the given UTC instant
    async fn send_scheduled(
        &self,
        queue: &QueueName,
        message: OutboundMessage,
        enqueue_at: DateTime<Utc>,
    ) -> Result<(), QueueError>;

    /// Pack the longest prefix of `messages` that fits one physical batch,
    /// send it, and return how many messages were sent
    ///
    /// The transport decides the boundary by accepting or rejecting each
    /// addition. Returning `0` means the first message does not fit even
    /// an empty batch.
    async fn send_prefix(
        &self,
        queue: &QueueName,
        messages: &[OutboundMessage],
    ) -> Result<usize, QueueError>;

    /// Receive up to `max_count` messages
    ///
    /// Opens a session-scoped receiver when a session id is supplied and
    /// a queue-scoped receiver otherwise. A queue with no available
    /// messages yields an empty vector, never an error.
    async fn receive(
        &self,
        queue: &QueueName,
        max_count: u32,
        session: Option<&SessionId>,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Acknowledge one previously received message
    async fn complete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError>;
}

// ============================================================================
// QueueClient Facade
// ============================================================================

/// Configured endpoint, target queue, and default content type
struct ChannelConfig {
    transport: Arc<dyn QueueTransport>,
    queue: QueueName,
    content_type: Option<String>,
}

/// Connection state for the facade
enum ChannelState {
    Unconfigured,
    Ready(ChannelConfig),
}

/// Queue client facade exposed to the host application
///
/// [`setup`](QueueClient::setup) is mandatory before any send or receive.
/// The property bag is instance state: mutations apply to all messages
/// sent afterwards, never retroactively.
pub struct QueueClient {
    state: ChannelState,
    properties: HashMap<String, String>,
}

impl QueueClient {
    /// Create a client with no transport configured
    pub fn new() -> Self {
        Self {
            state: ChannelState::Unconfigured,
            properties: HashMap::new(),
        }
    }

    /// Connect to a Service Bus namespace and select a target queue
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty connection string or an
    /// invalid queue name, `Upstream` if the transport cannot connect.
    pub async fn setup(
        &mut self,
        connection_string: &str,
        queue: &str,
        content_type: Option<&str>,
    ) -> Result<(), QueueError> {
        if connection_string.trim().is_empty() {
            return Err(QueueError::invalid(
                "connection_string",
                "must not be empty",
            ));
        }
        let queue = QueueName::new(queue)?;

        let transport = AzureQueueTransport::connect(connection_string).await?;
        info!(queue = %queue, "Queue client configured");

        self.state = ChannelState::Ready(ChannelConfig {
            transport: Arc::new(transport),
            queue,
            content_type: content_type.map(str::to_string),
        });
        Ok(())
    }

    /// Attach an already constructed transport
    ///
    /// Used by the host's dependency injection and by tests to supply a
    /// substitute transport.
    pub fn setup_with(
        &mut self,
        transport: Arc<dyn QueueTransport>,
        queue: QueueName,
        content_type: Option<String>,
    ) {
        self.state = ChannelState::Ready(ChannelConfig {
            transport,
            queue,
            content_type,
        });
    }

    /// Switch the target queue without re-supplying the endpoint
    ///
    /// # Errors
    /// Returns `NotConfigured` if `setup` was never called.
    pub fn switch_queue(&mut self, queue: &str) -> Result<(), QueueError> {
        let queue = QueueName::new(queue)?;
        match &mut self.state {
            ChannelState::Ready(config) => {
                debug!(from = %config.queue, to = %queue, "Switching target queue");
                config.queue = queue;
                Ok(())
            }
            ChannelState::Unconfigured => Err(QueueError::NotConfigured),
        }
    }

    /// Check whether the client has been configured
    pub fn is_configured(&self) -> bool {
        matches!(self.state, ChannelState::Ready(_))
    }

    // ------------------------------------------------------------------------
    // Property bag
    // ------------------------------------------------------------------------

    /// Add a property or replace its value
    ///
    /// Applies to all messages sent afterwards, not retroactively.
    pub fn add_or_update_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Remove a property; returns whether it was present
    pub fn remove_property(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    /// Remove all properties
    pub fn clear_properties(&mut self) {
        self.properties.clear();
    }

    /// Current contents of the property bag
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    // ------------------------------------------------------------------------
    // Send / receive operations
    // ------------------------------------------------------------------------

    fn channel(&self) -> Result<&ChannelConfig, QueueError> {
        match &self.state {
            ChannelState::Ready(config) => Ok(config),
            ChannelState::Unconfigured => Err(QueueError::NotConfigured),
        }
    }

    /// Stamp content type, session id, and the current property bag onto
    /// an outgoing body
    fn build_message(
        &self,
        config: &ChannelConfig,
        body: Bytes,
        session_id: Option<&str>,
    ) -> Result<OutboundMessage, QueueError> {
        let mut message = OutboundMessage::new(body);
        message.content_type = config.content_type.clone();
        message.properties = self.properties.clone();
        if let Some(session) = session_id {
            message.session_id = Some(SessionId::new(session)?);
        }
        Ok(message)
    }

    fn parse_session(session_id: Option<&str>) -> Result<Option<SessionId>, QueueError> {
        session_id.map(SessionId::new).transpose()
    }

    /// Send one message to the target queue
    pub async fn send_message(
        &self,
        body: impl Into<Bytes>,
        session_id: Option<&str>,
    ) -> Result<(), QueueError> {
        let config = self.channel()?;
        let message = self.build_message(config, body.into(), session_id)?;

        config
            .transport
            .send(&config.queue, message)
            .await
            .map_err(|e| {
                error!(queue = %config.queue, error = %e, "Failed to send message");
                e
            })
    }

    /// Send a run of messages, splitting into as many physical batches as
    /// the transport requires
    ///
    /// Input order is preserved within and across batches. Batches are
    /// sent in order and are not transactional: a failure part-way leaves
    /// earlier batches delivered.
    pub async fn send_batch(
        &self,
        bodies: Vec<Bytes>,
        session_id: Option<&str>,
    ) -> Result<(), QueueError> {
        let config = self.channel()?;

        let messages = bodies
            .into_iter()
            .map(|body| self.build_message(config, body, session_id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut offset = 0;
        let mut batches = 0;
        while offset < messages.len() {
            let sent = config
                .transport
                .send_prefix(&config.queue, &messages[offset..])
                .await
                .map_err(|e| {
                    error!(
                        queue = %config.queue,
                        sent = offset,
                        error = %e,
                        "Batch send failed part-way; earlier batches are not rolled back"
                    );
                    e
                })?;

            if sent == 0 {
                return Err(QueueError::MessageTooLarge { index: offset });
            }
            offset += sent;
            batches += 1;
        }

        debug!(queue = %config.queue, messages = offset, batches, "Batch send complete");
        Ok(())
    }

    /// Send one message that becomes visible at the given UTC instant
    pub async fn send_scheduled(
        &self,
        body: impl Into<Bytes>,
        enqueue_at: DateTime<Utc>,
        session_id: Option<&str>,
    ) -> Result<(), QueueError> {
        let config = self.channel()?;
        let message = self.build_message(config, body.into(), session_id)?;

        config
            .transport
            .send_scheduled(&config.queue, message, enqueue_at)
            .await
            .map_err(|e| {
                error!(queue = %config.queue, error = %e, "Failed to send scheduled message");
                e
            })
    }

    /// Receive up to `max_count` messages from the target queue
    ///
    /// Supplying a session id opens a session-scoped receiver. An empty
    /// queue yields an empty vector.
    pub async fn receive(
        &self,
        max_count: u32,
        session_id: Option<&str>,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let config = self.channel()?;
        let session = Self::parse_session(session_id)?;

        config
            .transport
            .receive(&config.queue, max_count, session.as_ref())
            .await
            .map_err(|e| {
                error!(queue = %config.queue, error = %e, "Failed to receive messages");
                e
            })
    }

    /// Acknowledge one previously received message
    ///
    /// Must be called with a message received from this client's
    /// transport; completing twice, or a message from a different
    /// receiver, is upstream-defined behavior.
    pub async fn complete(&self, message: &ReceivedMessage) -> Result<(), QueueError> {
        let config = self.channel()?;

        config
            .transport
            .complete(&message.receipt)
            .await
            .map_err(|e| {
                error!(
                    receipt = %message.receipt.handle(),
                    error = %e,
                    "Failed to complete message"
                );
                e
            })
    }
}

impl Default for QueueClient {
    fn default() -> Self {
        Self::new()
    }
}
