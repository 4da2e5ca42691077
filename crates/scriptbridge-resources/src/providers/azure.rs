//! Azure Resource Manager backend implementation.
//!
//! Production management-plane integration with ambient credential
//! resolution. Pageable listings are drained eagerly into plain values;
//! SDK model tags (a JSON object of string values) are flattened into
//! string maps.

use crate::client::ResourceManager;
use crate::error::ResourceError;
use crate::model::{ResourceGroupInfo, ResourceItem, SubscriptionInfo};
use async_trait::async_trait;
use azure_identity::create_default_credential;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Azure Resource Manager backend with ambient credential authentication
pub struct AzureResourceManager {
    resources: azure_mgmt_resources::Client,
    subscriptions: azure_mgmt_resources::package_subscriptions_2021_01::Client,
}

impl AzureResourceManager {
    /// Build the management client using the default credential chain
    ///
    /// No network call is made until the first operation.
    pub fn connect() -> Result<Self, ResourceError> {
        let credential = create_default_credential()
            .map_err(|e| ResourceError::upstream("initialize", e.to_string()))?;
        let resources = azure_mgmt_resources::Client::builder(credential.clone())
            .build()
            .map_err(|e| ResourceError::upstream("initialize", e.to_string()))?;
        let subscriptions =
            azure_mgmt_resources::package_subscriptions_2021_01::Client::builder(credential)
                .build()
                .map_err(|e| ResourceError::upstream("initialize", e.to_string()))?;

        info!("Connected to Azure Resource Manager");
        Ok(Self {
            resources,
            subscriptions,
        })
    }

    /// Flatten the SDK's tag object into a string map
    fn tags_to_map(tags: Option<serde_json::Value>) -> HashMap<String, String> {
        tags.as_ref()
            .and_then(serde_json::Value::as_object)
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|v| (key.clone(), v.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether an SDK error reports an absent resource
    fn is_not_found(error: &azure_core::Error) -> bool {
        let message = error.to_string();
        message.contains("404")
            || message.contains("NotFound")
            || message.contains("SubscriptionNotFound")
    }

    /// Map an Azure SDK error to the facade taxonomy
    fn map_error(operation: &str, error: azure_core::Error) -> ResourceError {
        ResourceError::upstream(operation, error.to_string())
    }
}

#[async_trait]
impl ResourceManager for AzureResourceManager {
    #[instrument(skip(self))]
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, ResourceError> {
        let mut subscriptions = Vec::new();
        let mut stream = self.subscriptions.subscriptions_client().list().into_stream();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(error = %e, "Failed to list subscriptions");
                Self::map_error("list_subscriptions", e)
            })?;
            for subscription in page.value {
                subscriptions.push(SubscriptionInfo {
                    id: subscription.subscription_id.unwrap_or_default(),
                    display_name: subscription.display_name.unwrap_or_default(),
                });
            }
        }

        debug!(count = subscriptions.len(), "Listed subscriptions");
        Ok(subscriptions)
    }

    #[instrument(skip(self))]
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionInfo>, ResourceError> {
        match self
            .subscriptions
            .subscriptions_client()
            .get(subscription_id)
            .await
        {
            Ok(subscription) => Ok(Some(SubscriptionInfo {
                id: subscription.subscription_id.unwrap_or_default(),
                display_name: subscription.display_name.unwrap_or_default(),
            })),
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => {
                error!(subscription_id, error = %e, "Failed to resolve subscription");
                Err(Self::map_error("get_subscription", e))
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroupInfo>, ResourceError> {
        let mut groups = Vec::new();
        let mut stream = self
            .resources
            .resource_groups_client()
            .list(subscription_id)
            .into_stream();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(error = %e, "Failed to list resource groups");
                Self::map_error("list_resource_groups", e)
            })?;
            for group in page.value {
                groups.push(ResourceGroupInfo {
                    name: group.name.unwrap_or_default(),
                    location: group.location,
                    tags: Self::tags_to_map(group.tags),
                });
            }
        }

        debug!(count = groups.len(), "Listed resource groups");
        Ok(groups)
    }

    #[instrument(skip(self))]
    async fn list_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ResourceItem>, ResourceError> {
        let mut resources = Vec::new();
        let mut stream = self
            .resources
            .resources_client()
            .list_by_resource_group(resource_group, subscription_id)
            .into_stream();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(resource_group, error = %e, "Failed to list resources");
                Self::map_error("list_resources", e)
            })?;
            for resource in page.value {
                resources.push(ResourceItem {
                    id: resource.generic_resource.resource.id.unwrap_or_default(),
                    name: resource.generic_resource.resource.name.unwrap_or_default(),
                    resource_type: resource.generic_resource.resource.type_.unwrap_or_default(),
                    location: resource
                        .generic_resource
                        .resource
                        .location
                        .unwrap_or_default(),
                    tags: Self::tags_to_map(resource.generic_resource.resource.tags),
                });
            }
        }

        debug!(resource_group, count = resources.len(), "Listed resources");
        Ok(resources)
    }

    #[instrument(skip(self))]
    async fn list_providers(&self, subscription_id: &str) -> Result<Vec<String>, ResourceError> {
        let mut namespaces = Vec::new();
        let mut stream = self
            .resources
            .providers_client()
            .list(subscription_id)
            .into_stream();

        while let Some(page) = stream.next().await {
            let page = page.map_err(|e| {
                error!(error = %e, "Failed to list providers");
                Self::map_error("list_providers", e)
            })?;
            namespaces.extend(
                page.value
                    .into_iter()
                    .filter_map(|provider| provider.namespace),
            );
        }

        debug!(count = namespaces.len(), "Listed provider namespaces");
        Ok(namespaces)
    }
}
