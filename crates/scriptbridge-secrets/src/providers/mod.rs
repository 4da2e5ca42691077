//! Vault backend implementations.

pub mod azure;
pub mod memory;

pub use azure::AzureSecretVault;
pub use memory::InMemorySecretVault;
