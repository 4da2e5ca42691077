//! Manager trait and the resource client facade.

use crate::error::ResourceError;
use crate::model::{
    self, resource_group_from_id, ResourceGroupInfo, ResourceItem, ResourceRecord,
    SubscriptionInfo,
};
use crate::providers::AzureResourceManager;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// ============================================================================
// Manager Trait
// ============================================================================

/// Interface implemented by management backends (Azure, in-memory)
///
/// All listings drain pagination eagerly and return plain values; the
/// facade layers the context guard, filtering, and record shaping on top.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// List every subscription visible to the authenticated identity
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, ResourceError>;

    /// Resolve one subscription; `None` if it cannot be found
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionInfo>, ResourceError>;

    /// List all resource groups in a subscription
    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroupInfo>, ResourceError>;

    /// List generic resources in one resource group
    async fn list_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ResourceItem>, ResourceError>;

    /// List provider namespaces registered for a subscription
    async fn list_providers(&self, subscription_id: &str) -> Result<Vec<String>, ResourceError>;
}

// ============================================================================
// ResourceClient Facade
// ============================================================================

/// Resource management facade exposed to the host application
///
/// `list_subscriptions` and `set_context` work without a context; every
/// other operation requires [`set_context`](ResourceClient::set_context)
/// to have succeeded first.
pub struct ResourceClient {
    manager: Arc<dyn ResourceManager>,
    context: Option<String>,
}

impl ResourceClient {
    /// Connect to the management API using ambient credentials
    pub fn connect() -> Result<Self, ResourceError> {
        let manager = AzureResourceManager::connect()?;
        Ok(Self::with_manager(Arc::new(manager)))
    }

    /// Wrap an already constructed management backend
    ///
    /// Used by the host's dependency injection and by tests to supply a
    /// substitute backend.
    pub fn with_manager(manager: Arc<dyn ResourceManager>) -> Self {
        Self {
            manager,
            context: None,
        }
    }

    /// Currently selected subscription, if any
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn require_context(&self) -> Result<&str, ResourceError> {
        self.context.as_deref().ok_or(ResourceError::NoContext)
    }

    /// List every subscription visible to the authenticated identity
    ///
    /// Works without a subscription context.
    pub async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, ResourceError> {
        self.manager.list_subscriptions().await.map_err(|e| {
            error!(error = %e, "Failed to list subscriptions");
            e
        })
    }

    /// Select the subscription all further operations run against
    ///
    /// # Errors
    /// Returns `InvalidArgument` for empty input and
    /// `SubscriptionNotFound` when the subscription cannot be resolved;
    /// the previous context is kept on failure.
    pub async fn set_context(&mut self, subscription_id: &str) -> Result<(), ResourceError> {
        if subscription_id.trim().is_empty() {
            return Err(ResourceError::invalid(
                "subscription_id",
                "must not be empty",
            ));
        }

        let resolved = self
            .manager
            .get_subscription(subscription_id)
            .await
            .map_err(|e| {
                error!(subscription_id, error = %e, "Failed to resolve subscription");
                e
            })?;

        match resolved {
            Some(subscription) => {
                info!(
                    subscription_id = %subscription.id,
                    display_name = %subscription.display_name,
                    "Subscription context set"
                );
                self.context = Some(subscription.id);
                Ok(())
            }
            None => Err(ResourceError::SubscriptionNotFound {
                subscription_id: subscription_id.to_string(),
            }),
        }
    }

    /// Resource groups whose tags contain the given name/value pair
    ///
    /// Tag values are compared with case-sensitive string equality.
    pub async fn get_resource_groups_by_tag(
        &self,
        tag_name: &str,
        tag_value: &str,
    ) -> Result<Vec<ResourceGroupInfo>, ResourceError> {
        let subscription = self.require_context()?;
        if tag_name.is_empty() {
            return Err(ResourceError::invalid("tag_name", "must not be empty"));
        }

        let groups = self.manager.list_resource_groups(subscription).await?;
        let matching = groups
            .into_iter()
            .filter(|group| group.tags.get(tag_name).map(String::as_str) == Some(tag_value))
            .collect::<Vec<_>>();

        debug!(tag_name, tag_value, count = matching.len(), "Groups matched tag");
        Ok(matching)
    }

    /// All resources in one resource group
    ///
    /// The owning group name in each record is re-derived from the
    /// resource's hierarchical identifier rather than taken from the
    /// argument, so records stay self-consistent even when the input name
    /// is cased differently or aliased. Identifiers without a group
    /// segment fall back to the queried name.
    pub async fn get_resources_in_resource_group(
        &self,
        resource_group: &str,
    ) -> Result<Vec<ResourceRecord>, ResourceError> {
        let subscription = self.require_context()?;
        if resource_group.trim().is_empty() {
            return Err(ResourceError::invalid("resource_group", "must not be empty"));
        }

        let items = self
            .manager
            .list_resources(subscription, resource_group)
            .await
            .map_err(|e| {
                error!(resource_group, error = %e, "Failed to list resources");
                e
            })?;

        Ok(items
            .into_iter()
            .map(|item| Self::to_record(item, resource_group))
            .collect())
    }

    /// All resources of an exact type across every group in the
    /// subscription
    pub async fn get_resources_by_type(
        &self,
        resource_type: &str,
    ) -> Result<Vec<ResourceRecord>, ResourceError> {
        if resource_type.trim().is_empty() {
            return Err(ResourceError::invalid("resource_type", "must not be empty"));
        }

        let all = self.scan_subscription().await?;
        Ok(all
            .into_iter()
            .filter(|(item, _)| item.resource_type == resource_type)
            .map(|(_, record)| record)
            .collect())
    }

    /// All resources carrying every supplied tag name/value pair, across
    /// every group in the subscription
    pub async fn get_resources_by_tags(
        &self,
        tags: &HashMap<String, String>,
    ) -> Result<Vec<ResourceRecord>, ResourceError> {
        if tags.is_empty() {
            return Err(ResourceError::invalid("tags", "must not be empty"));
        }

        let all = self.scan_subscription().await?;
        Ok(all
            .into_iter()
            .filter(|(item, _)| {
                tags.iter()
                    .all(|(name, value)| item.tags.get(name) == Some(value))
            })
            .map(|(_, record)| record)
            .collect())
    }

    /// Count every resource in the subscription by location
    pub async fn count_resources_by_location(
        &self,
    ) -> Result<HashMap<String, usize>, ResourceError> {
        let all = self.scan_subscription().await?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for (_, record) in all {
            *counts.entry(record.location).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Provider namespaces registered for the current subscription
    pub async fn list_resource_providers(&self) -> Result<Vec<String>, ResourceError> {
        let subscription = self.require_context()?;

        self.manager.list_providers(subscription).await.map_err(|e| {
            error!(error = %e, "Failed to list resource providers");
            e
        })
    }

    /// Check whether a named resource exists in a resource group
    pub async fn resource_exists(
        &self,
        resource_group: &str,
        resource_name: &str,
    ) -> Result<bool, ResourceError> {
        let records = self.get_resources_in_resource_group(resource_group).await?;
        Ok(records.iter().any(|record| record.name == resource_name))
    }

    /// Serialize resource records as human-readable JSON
    pub fn export_to_json(&self, records: &[ResourceRecord]) -> Result<String, ResourceError> {
        model::export_to_json(records)
    }

    /// Write resource records to a file, replacing any existing content
    pub async fn save_to_json_file(
        &self,
        records: &[ResourceRecord],
        path: &Path,
    ) -> Result<(), ResourceError> {
        model::save_to_json_file(records, path).await
    }

    /// Enumerate every resource in every group of the current
    /// subscription
    ///
    /// Group scans are sequential and not atomic: a failure part-way
    /// surfaces after earlier groups have already been read.
    async fn scan_subscription(
        &self,
    ) -> Result<Vec<(ResourceItem, ResourceRecord)>, ResourceError> {
        let subscription = self.require_context()?;

        let groups = self.manager.list_resource_groups(subscription).await?;
        let mut all = Vec::new();
        for group in &groups {
            let items = self
                .manager
                .list_resources(subscription, &group.name)
                .await
                .map_err(|e| {
                    error!(resource_group = %group.name, error = %e, "Subscription scan failed");
                    e
                })?;
            for item in items {
                let record = Self::to_record(item.clone(), &group.name);
                all.push((item, record));
            }
        }

        debug!(groups = groups.len(), resources = all.len(), "Subscription scan complete");
        Ok(all)
    }

    fn to_record(item: ResourceItem, fallback_group: &str) -> ResourceRecord {
        let resource_group = resource_group_from_id(&item.id)
            .unwrap_or(fallback_group)
            .to_string();

        ResourceRecord {
            name: item.name,
            id: item.id,
            resource_type: item.resource_type,
            location: item.location,
            resource_group,
        }
    }
}
