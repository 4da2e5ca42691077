//! In-memory queue transport for testing and development.
//!
//! Fully functional implementation of [`QueueTransport`] with FIFO
//! queues, session partitions, scheduled visibility, and in-flight
//! tracking. The physical batch capacity is a configurable message count
//! (the real transport bounds batches by size in bytes); every physical
//! batch send is recorded so tests can observe where runs were split.

use crate::client::QueueTransport;
use crate::error::QueueError;
use crate::message::{OutboundMessage, QueueName, ReceiptHandle, ReceivedMessage, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

const DEFAULT_BATCH_CAPACITY: usize = 100;

/// A message sitting in an in-memory queue
struct StoredMessage {
    message: OutboundMessage,
    available_at: Option<DateTime<Utc>>,
}

impl StoredMessage {
    fn is_available(&self, now: DateTime<Utc>) -> bool {
        match self.available_at {
            Some(at) => now >= at,
            None => true,
        }
    }
}

/// Backing state shared by clones of the transport
struct TransportState {
    queues: HashMap<QueueName, VecDeque<StoredMessage>>,
    /// Receipt handle -> in-flight message, keyed for completion
    in_flight: HashMap<String, OutboundMessage>,
    /// Sizes of every physical batch send, in order
    batch_log: Vec<usize>,
    calls: u64,
}

/// Thread-safe in-memory queue transport
#[derive(Clone)]
pub struct InMemoryQueueTransport {
    state: Arc<Mutex<TransportState>>,
    batch_capacity: usize,
}

impl InMemoryQueueTransport {
    /// Create a transport with the default batch capacity
    pub fn new() -> Self {
        Self::with_batch_capacity(DEFAULT_BATCH_CAPACITY)
    }

    /// Create a transport whose physical batches hold at most
    /// `batch_capacity` messages
    pub fn with_batch_capacity(batch_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(TransportState {
                queues: HashMap::new(),
                in_flight: HashMap::new(),
                batch_log: Vec::new(),
                calls: 0,
            })),
            batch_capacity,
        }
    }

    /// Number of transport operations invoked so far
    ///
    /// Used by guard tests to verify that precondition failures never
    /// reach the transport.
    pub fn call_count(&self) -> u64 {
        self.state.lock().unwrap().calls
    }

    /// Sizes of the physical batch sends issued so far, in order
    pub fn batch_log(&self) -> Vec<usize> {
        self.state.lock().unwrap().batch_log.clone()
    }

    /// Number of messages currently queued (available or scheduled)
    pub fn queued_len(&self, queue: &QueueName) -> usize {
        self.state
            .lock()
            .unwrap()
            .queues
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    /// Number of received-but-uncompleted messages
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }

    /// Bodies of all queued messages, in FIFO order (test helper)
    pub fn queued_bodies(&self, queue: &QueueName) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .queues
            .get(queue)
            .map(|q| q.iter().map(|m| m.message.body.to_vec()).collect())
            .unwrap_or_default()
    }

    fn enqueue(
        state: &mut TransportState,
        queue: &QueueName,
        message: OutboundMessage,
        available_at: Option<DateTime<Utc>>,
    ) {
        state
            .queues
            .entry(queue.clone())
            .or_default()
            .push_back(StoredMessage {
                message,
                available_at,
            });
    }
}

impl Default for InMemoryQueueTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueTransport {
    async fn send(&self, queue: &QueueName, message: OutboundMessage) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Self::enqueue(&mut state, queue, message, None);
        Ok(())
    }

    async fn send_scheduled(
        &self,
        queue: &QueueName,
        message: OutboundMessage,
        enqueue_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Self::enqueue(&mut state, queue, message, Some(enqueue_at));
        Ok(())
    }

    async fn send_prefix(
        &self,
        queue: &QueueName,
        messages: &[OutboundMessage],
    ) -> Result<usize, QueueError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let accepted = messages.len().min(self.batch_capacity);
        if accepted == 0 {
            return Ok(0);
        }

        for message in &messages[..accepted] {
            Self::enqueue(&mut state, queue, message.clone(), None);
        }
        state.batch_log.push(accepted);
        Ok(accepted)
    }

    async fn receive(
        &self,
        queue: &QueueName,
        max_count: u32,
        session: Option<&SessionId>,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let receiver_key = match session {
            Some(session) => format!("{}::{}", queue, session),
            None => queue.to_string(),
        };

        let now = Utc::now();
        let mut received = Vec::new();

        if let Some(stored) = state.queues.get_mut(queue) {
            let mut remaining = VecDeque::with_capacity(stored.len());
            while let Some(candidate) = stored.pop_front() {
                let matches_session = match session {
                    Some(session) => candidate.message.session_id.as_ref() == Some(session),
                    None => true,
                };

                if received.len() < max_count as usize
                    && matches_session
                    && candidate.is_available(now)
                {
                    received.push(candidate.message);
                } else {
                    remaining.push_back(candidate);
                }
            }
            *stored = remaining;
        }

        let mut out = Vec::with_capacity(received.len());
        for message in received {
            let receipt = ReceiptHandle::new(uuid::Uuid::new_v4().to_string(), &receiver_key);
            state
                .in_flight
                .insert(receipt.handle().to_string(), message.clone());
            out.push(ReceivedMessage {
                body: message.body,
                content_type: message.content_type,
                properties: message.properties,
                session_id: message.session_id,
                receipt,
            });
        }

        Ok(out)
    }

    async fn complete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        state
            .in_flight
            .remove(receipt.handle())
            .map(|_| ())
            .ok_or_else(|| {
                QueueError::upstream(
                    "complete",
                    format!("unknown or already completed receipt '{}'", receipt.handle()),
                )
            })
    }
}
