//! In-memory management backend for testing and development.
//!
//! Fixture-style backend: subscriptions, groups, and resources are
//! registered up front with builder methods, then served back through
//! the [`ResourceManager`] trait. Group lookups are case-insensitive the
//! way the management API resolves names, which lets tests exercise the
//! facade's identifier-derived group naming.

use crate::client::ResourceManager;
use crate::error::ResourceError;
use crate::model::{ResourceGroupInfo, ResourceItem, SubscriptionInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Backing state shared by clones of the backend
struct ManagerState {
    subscriptions: Vec<SubscriptionInfo>,
    /// subscription id -> groups
    groups: HashMap<String, Vec<ResourceGroupInfo>>,
    /// (subscription id, lowercased group name) -> resources
    resources: HashMap<(String, String), Vec<ResourceItem>>,
    providers: HashMap<String, Vec<String>>,
    calls: u64,
}

/// Thread-safe in-memory management backend
#[derive(Clone)]
pub struct InMemoryResourceManager {
    state: Arc<RwLock<ManagerState>>,
}

impl InMemoryResourceManager {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ManagerState {
                subscriptions: Vec::new(),
                groups: HashMap::new(),
                resources: HashMap::new(),
                providers: HashMap::new(),
                calls: 0,
            })),
        }
    }

    /// Register a subscription
    pub fn with_subscription(self, id: &str, display_name: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .subscriptions
            .push(SubscriptionInfo {
                id: id.to_string(),
                display_name: display_name.to_string(),
            });
        self
    }

    /// Register a resource group under a subscription
    pub fn with_group(
        self,
        subscription_id: &str,
        name: &str,
        location: &str,
        tags: &[(&str, &str)],
    ) -> Self {
        self.state
            .write()
            .unwrap()
            .groups
            .entry(subscription_id.to_string())
            .or_default()
            .push(ResourceGroupInfo {
                name: name.to_string(),
                location: location.to_string(),
                tags: tags
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        self
    }

    /// Register a resource under a subscription and group
    ///
    /// The identifier is built in the management API's hierarchical path
    /// shape from the registered group name.
    pub fn with_resource(
        self,
        subscription_id: &str,
        group: &str,
        name: &str,
        resource_type: &str,
        location: &str,
        tags: &[(&str, &str)],
    ) -> Self {
        let id = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            subscription_id, group, resource_type, name
        );
        self.with_raw_resource(
            subscription_id,
            group,
            ResourceItem {
                id,
                name: name.to_string(),
                resource_type: resource_type.to_string(),
                location: location.to_string(),
                tags: tags
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        )
    }

    /// Register a resource with a caller-supplied identifier
    pub fn with_raw_resource(
        self,
        subscription_id: &str,
        group: &str,
        item: ResourceItem,
    ) -> Self {
        self.state
            .write()
            .unwrap()
            .resources
            .entry((subscription_id.to_string(), group.to_lowercase()))
            .or_default()
            .push(item);
        self
    }

    /// Register provider namespaces for a subscription
    pub fn with_providers(self, subscription_id: &str, namespaces: &[&str]) -> Self {
        self.state
            .write()
            .unwrap()
            .providers
            .insert(
                subscription_id.to_string(),
                namespaces.iter().map(|n| n.to_string()).collect(),
            );
        self
    }

    /// Number of backend operations invoked so far
    ///
    /// Used by guard tests to verify that precondition failures never
    /// reach the backend.
    pub fn call_count(&self) -> u64 {
        self.state.read().unwrap().calls
    }

    fn record_call(&self) {
        self.state.write().unwrap().calls += 1;
    }
}

impl Default for InMemoryResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceManager for InMemoryResourceManager {
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, ResourceError> {
        self.record_call();
        Ok(self.state.read().unwrap().subscriptions.clone())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionInfo>, ResourceError> {
        self.record_call();
        Ok(self
            .state
            .read()
            .unwrap()
            .subscriptions
            .iter()
            .find(|subscription| subscription.id == subscription_id)
            .cloned())
    }

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroupInfo>, ResourceError> {
        self.record_call();
        Ok(self
            .state
            .read()
            .unwrap()
            .groups
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ResourceItem>, ResourceError> {
        self.record_call();
        Ok(self
            .state
            .read()
            .unwrap()
            .resources
            .get(&(subscription_id.to_string(), resource_group.to_lowercase()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_providers(&self, subscription_id: &str) -> Result<Vec<String>, ResourceError> {
        self.record_call();
        Ok(self
            .state
            .read()
            .unwrap()
            .providers
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }
}
