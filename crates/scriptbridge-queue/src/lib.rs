//! # scriptbridge-queue
//!
//! Azure Service Bus queue facade for the scriptbridge plugin family.
//!
//! This crate provides:
//! - A [`QueueClient`](client::QueueClient) facade with a typed
//!   configured/unconfigured state guard and runtime queue switching
//! - A message-property bag stamped onto every subsequent outgoing message
//! - Single, scheduled, and transport-bounded batch sends (the transport,
//!   not a fixed count, decides where a batch splits)
//! - Session- or queue-scoped receives and message completion
//! - A production Azure adapter and an in-memory adapter for tests and
//!   local development
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for queue operations
//! - [`message`] - Queue names, session ids, messages, receipt handles
//! - [`client`] - The transport trait and the facade
//! - [`providers`] - Azure and in-memory transports

// Module declarations
pub mod client;
pub mod error;
pub mod message;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueClient, QueueTransport};
pub use error::QueueError;
pub use message::{OutboundMessage, QueueName, ReceiptHandle, ReceivedMessage, SessionId};
pub use providers::{AzureQueueTransport, InMemoryQueueTransport};
