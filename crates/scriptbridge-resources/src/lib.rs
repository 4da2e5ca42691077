//! # scriptbridge-resources
//!
//! Azure Resource Manager facade for the scriptbridge plugin family.
//!
//! This crate provides:
//! - A [`ResourceClient`](client::ResourceClient) facade with a
//!   subscription-context guard
//! - Subscription listing and context selection
//! - Resource-group lookup by tag, resource enumeration and filtering by
//!   type or tags, location counting, and provider listing
//! - Owning-group names re-derived from each resource's hierarchical
//!   identifier rather than trusted from caller input
//! - JSON export of resource records to a string or a file
//! - A production Azure adapter and an in-memory adapter for tests and
//!   local development
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for management operations
//! - [`model`] - Resource records, subscription/group info, id parsing,
//!   and JSON export
//! - [`client`] - The manager trait and the facade
//! - [`providers`] - Azure and in-memory managers

// Module declarations
pub mod client;
pub mod error;
pub mod model;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{ResourceClient, ResourceManager};
pub use error::ResourceError;
pub use model::{
    resource_group_from_id, ResourceGroupInfo, ResourceItem, ResourceRecord, SubscriptionInfo,
};
pub use providers::{AzureResourceManager, InMemoryResourceManager};
