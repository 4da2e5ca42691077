//! Queue transport implementations.

pub mod azure;
pub mod memory;

pub use azure::AzureQueueTransport;
pub use memory::InMemoryQueueTransport;
