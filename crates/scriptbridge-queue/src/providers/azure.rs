//! Azure Service Bus transport implementation.
//!
//! Production Service Bus integration over AMQP with:
//! - Connection-string authentication
//! - Sender and receiver caching per queue (and per session)
//! - Transport-sized batching via `try_add_message`
//! - Scheduled delivery and session-scoped receivers
//!
//! Received messages are parked in an in-flight registry keyed by receipt
//! handle so completion can be routed back to the receiver that produced
//! them; the service defines what happens when a message is completed
//! twice or through another receiver.

use crate::client::QueueTransport;
use crate::error::QueueError;
use crate::message::{OutboundMessage, QueueName, ReceiptHandle, ReceivedMessage, SessionId};
use async_trait::async_trait;
use azservicebus::core::BasicRetryPolicy;
use azservicebus::{
    ServiceBusClient, ServiceBusClientOptions, ServiceBusMessage, ServiceBusReceiver,
    ServiceBusReceiverOptions, ServiceBusSender, ServiceBusSenderOptions,
    ServiceBusSessionReceiver, ServiceBusSessionReceiverOptions,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

/// How long a receive call waits before reporting an empty queue
const RECEIVE_MAX_WAIT: Duration = Duration::from_secs(5);

/// A cached receiver, queue- or session-scoped
enum CachedReceiver {
    Queue(Arc<Mutex<ServiceBusReceiver>>),
    Session(Arc<Mutex<ServiceBusSessionReceiver>>),
}

/// A received SDK message parked until completion
struct InFlightMessage {
    receiver_key: String,
    message: azservicebus::ServiceBusReceivedMessage,
}

/// Azure Service Bus queue transport
pub struct AzureQueueTransport {
    client: Mutex<ServiceBusClient<BasicRetryPolicy>>,
    // Sender cache: queue name -> sender
    senders: RwLock<HashMap<String, Arc<Mutex<ServiceBusSender>>>>,
    // Receiver cache: receiver key -> receiver
    receivers: RwLock<HashMap<String, CachedReceiver>>,
    // In-flight registry: receipt handle -> parked message
    in_flight: RwLock<HashMap<String, InFlightMessage>>,
}

impl AzureQueueTransport {
    /// Connect to a Service Bus namespace with a connection string
    #[instrument(skip(connection_string))]
    pub async fn connect(connection_string: &str) -> Result<Self, QueueError> {
        let client = ServiceBusClient::new_from_connection_string(
            connection_string,
            ServiceBusClientOptions::default(),
        )
        .await
        .map_err(|e| QueueError::upstream("setup", e.to_string()))?;

        info!("Connected to Azure Service Bus");

        Ok(Self {
            client: Mutex::new(client),
            senders: RwLock::new(HashMap::new()),
            receivers: RwLock::new(HashMap::new()),
            in_flight: RwLock::new(HashMap::new()),
        })
    }

    fn receiver_key(queue: &QueueName, session: Option<&SessionId>) -> String {
        match session {
            Some(session) => format!("{}::{}", queue, session),
            None => queue.to_string(),
        }
    }

    /// Get or create sender for queue (with double-check locking)
    async fn get_or_create_sender(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<Mutex<ServiceBusSender>>, QueueError> {
        // First check with read lock
        {
            let senders = self.senders.read().await;
            if let Some(sender) = senders.get(queue.as_str()) {
                return Ok(Arc::clone(sender));
            }
        }

        // Need to create - acquire write lock
        let mut senders = self.senders.write().await;

        // Double-check: another task might have created it
        if let Some(sender) = senders.get(queue.as_str()) {
            return Ok(Arc::clone(sender));
        }

        let sender = {
            let mut client = self.client.lock().await;
            client
                .create_sender(queue.as_str(), ServiceBusSenderOptions::default())
                .await
                .map_err(|e| QueueError::upstream("send", e.to_string()))?
        };

        let sender = Arc::new(Mutex::new(sender));
        senders.insert(queue.as_str().to_string(), Arc::clone(&sender));
        Ok(sender)
    }

    /// Get or create a queue- or session-scoped receiver
    async fn get_or_create_receiver(
        &self,
        queue: &QueueName,
        session: Option<&SessionId>,
    ) -> Result<CachedReceiver, QueueError> {
        let key = Self::receiver_key(queue, session);

        {
            let receivers = self.receivers.read().await;
            if let Some(receiver) = receivers.get(&key) {
                return Ok(Self::clone_cached(receiver));
            }
        }

        let mut receivers = self.receivers.write().await;
        if let Some(receiver) = receivers.get(&key) {
            return Ok(Self::clone_cached(receiver));
        }

        let created = {
            let mut client = self.client.lock().await;
            match session {
                Some(session) => {
                    let receiver = client
                        .accept_session_for_queue(
                            queue.as_str(),
                            session.as_str(),
                            ServiceBusSessionReceiverOptions::default(),
                        )
                        .await
                        .map_err(|e| QueueError::upstream("receive", e.to_string()))?;
                    CachedReceiver::Session(Arc::new(Mutex::new(receiver)))
                }
                None => {
                    let receiver = client
                        .create_receiver_for_queue(
                            queue.as_str(),
                            ServiceBusReceiverOptions::default(),
                        )
                        .await
                        .map_err(|e| QueueError::upstream("receive", e.to_string()))?;
                    CachedReceiver::Queue(Arc::new(Mutex::new(receiver)))
                }
            }
        };

        receivers.insert(key, Self::clone_cached(&created));
        Ok(created)
    }

    fn clone_cached(receiver: &CachedReceiver) -> CachedReceiver {
        match receiver {
            CachedReceiver::Queue(r) => CachedReceiver::Queue(Arc::clone(r)),
            CachedReceiver::Session(r) => CachedReceiver::Session(Arc::clone(r)),
        }
    }

    /// Map an outbound message onto the SDK message type
    fn to_sdk_message(message: &OutboundMessage) -> Result<ServiceBusMessage, QueueError> {
        let mut sdk = ServiceBusMessage::new(message.body.to_vec());

        if let Some(content_type) = &message.content_type {
            sdk.set_content_type(content_type.clone());
        }
        if let Some(session) = &message.session_id {
            sdk.set_session_id(session.as_str().to_string())
                .map_err(|e| QueueError::invalid("session_id", e.to_string()))?;
        }
        for (key, value) in &message.properties {
            sdk.application_properties_mut()
                .get_or_insert_with(Default::default)
                .insert(key.clone(), value.clone().into());
        }

        Ok(sdk)
    }

    /// Map a received SDK message into the crate type, parking the
    /// original for completion
    async fn park_received(
        &self,
        receiver_key: &str,
        message: azservicebus::ServiceBusReceivedMessage,
    ) -> Result<ReceivedMessage, QueueError> {
        let body = message
            .body()
            .map_err(|e| QueueError::upstream("receive", e.to_string()))?
            .to_vec();

        let mut properties = HashMap::new();
        if let Some(application_properties) = message.application_properties() {
            for (key, value) in application_properties.iter() {
                properties.insert(key.clone(), format!("{:?}", value));
            }
        }

        let content_type = message.content_type().map(str::to_string);
        let session_id = match message.session_id() {
            Some(session) => Some(SessionId::new(session)?),
            None => None,
        };

        let receipt = ReceiptHandle::new(uuid::Uuid::new_v4().to_string(), receiver_key);
        self.in_flight.write().await.insert(
            receipt.handle().to_string(),
            InFlightMessage {
                receiver_key: receiver_key.to_string(),
                message,
            },
        );

        Ok(ReceivedMessage {
            body: body.into(),
            content_type,
            properties,
            session_id,
            receipt,
        })
    }
}

#[async_trait]
impl QueueTransport for AzureQueueTransport {
    #[instrument(skip(self, message))]
    async fn send(&self, queue: &QueueName, message: OutboundMessage) -> Result<(), QueueError> {
        let sender = self.get_or_create_sender(queue).await?;
        let sdk = Self::to_sdk_message(&message)?;

        let mut sender = sender.lock().await;
        sender.send_message(sdk).await.map_err(|e| {
            error!(queue = %queue, error = %e, "Send failed");
            QueueError::upstream("send", e.to_string())
        })?;

        debug!(queue = %queue, "Message sent");
        Ok(())
    }

    #[instrument(skip(self, message))]
    async fn send_scheduled(
        &self,
        queue: &QueueName,
        message: OutboundMessage,
        enqueue_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        let sender = self.get_or_create_sender(queue).await?;
        let sdk = Self::to_sdk_message(&message)?;

        let enqueue_at = time::OffsetDateTime::from_unix_timestamp(enqueue_at.timestamp())
            .map_err(|e| QueueError::invalid("enqueue_at", e.to_string()))?;

        let mut sender = sender.lock().await;
        let sequence = sender.schedule_message(sdk, enqueue_at).await.map_err(|e| {
            error!(queue = %queue, error = %e, "Scheduled send failed");
            QueueError::upstream("send_scheduled", e.to_string())
        })?;

        debug!(queue = %queue, sequence, "Scheduled message enqueued");
        Ok(())
    }

    #[instrument(skip(self, messages))]
    async fn send_prefix(
        &self,
        queue: &QueueName,
        messages: &[OutboundMessage],
    ) -> Result<usize, QueueError> {
        let sender = self.get_or_create_sender(queue).await?;
        let mut sender = sender.lock().await;

        let mut batch = sender
            .create_message_batch(Default::default())
            .map_err(|e| QueueError::upstream("send_batch", e.to_string()))?;

        // The transport decides the boundary: keep adding until the batch
        // rejects a message.
        let mut accepted = 0;
        for message in messages {
            let sdk = Self::to_sdk_message(message)?;
            if batch.try_add_message(sdk).is_err() {
                break;
            }
            accepted += 1;
        }

        if accepted == 0 {
            return Ok(0);
        }

        sender.send_message_batch(batch).await.map_err(|e| {
            error!(queue = %queue, accepted, error = %e, "Batch send failed");
            QueueError::upstream("send_batch", e.to_string())
        })?;

        debug!(queue = %queue, accepted, "Batch sent");
        Ok(accepted)
    }

    #[instrument(skip(self))]
    async fn receive(
        &self,
        queue: &QueueName,
        max_count: u32,
        session: Option<&SessionId>,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let receiver_key = Self::receiver_key(queue, session);
        let receiver = self.get_or_create_receiver(queue, session).await?;

        let sdk_messages = match &receiver {
            CachedReceiver::Queue(r) => {
                let mut r = r.lock().await;
                r.receive_messages_with_max_wait_time(max_count, RECEIVE_MAX_WAIT)
                    .await
                    .map_err(|e| QueueError::upstream("receive", e.to_string()))?
            }
            CachedReceiver::Session(r) => {
                let mut r = r.lock().await;
                r.receive_messages_with_max_wait_time(max_count, RECEIVE_MAX_WAIT)
                    .await
                    .map_err(|e| QueueError::upstream("receive", e.to_string()))?
            }
        };

        let mut received = Vec::with_capacity(sdk_messages.len());
        for message in sdk_messages {
            received.push(self.park_received(&receiver_key, message).await?);
        }

        debug!(queue = %queue, count = received.len(), "Messages received");
        Ok(received)
    }

    #[instrument(skip(self))]
    async fn complete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        let parked = self
            .in_flight
            .write()
            .await
            .remove(receipt.handle())
            .ok_or_else(|| {
                QueueError::upstream(
                    "complete",
                    format!("unknown or already completed receipt '{}'", receipt.handle()),
                )
            })?;

        let receiver = {
            let receivers = self.receivers.read().await;
            receivers
                .get(&parked.receiver_key)
                .map(Self::clone_cached)
                .ok_or_else(|| {
                    QueueError::upstream(
                        "complete",
                        format!("receiver '{}' is no longer open", parked.receiver_key),
                    )
                })?
        };

        match receiver {
            CachedReceiver::Queue(r) => {
                let mut r = r.lock().await;
                r.complete_message(&parked.message)
                    .await
                    .map_err(|e| QueueError::upstream("complete", e.to_string()))
            }
            CachedReceiver::Session(r) => {
                let mut r = r.lock().await;
                r.complete_message(&parked.message)
                    .await
                    .map_err(|e| QueueError::upstream("complete", e.to_string()))
            }
        }
    }
}
