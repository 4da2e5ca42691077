//! Table store implementations.

pub mod azure;
pub mod memory;

pub use azure::AzureTableStore;
pub use memory::InMemoryTableStore;
