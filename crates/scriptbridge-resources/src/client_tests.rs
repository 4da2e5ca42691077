//! Tests for the resource client facade.

use super::*;
use crate::providers::InMemoryResourceManager;

fn fixture() -> InMemoryResourceManager {
    InMemoryResourceManager::new()
        .with_subscription("sub-1", "Production")
        .with_subscription("sub-2", "Sandbox")
        .with_group("sub-1", "rg1", "eastus", &[("env", "prod"), ("team", "web")])
        .with_group("sub-1", "rg2", "westus", &[("env", "dev")])
        .with_resource(
            "sub-1",
            "rg1",
            "web-1",
            "Microsoft.Web/sites",
            "eastus",
            &[("env", "prod"), ("tier", "frontend")],
        )
        .with_resource(
            "sub-1",
            "rg1",
            "db-1",
            "Microsoft.Sql/servers",
            "eastus",
            &[("env", "prod")],
        )
        .with_resource(
            "sub-1",
            "rg2",
            "web-2",
            "Microsoft.Web/sites",
            "eastus",
            &[("env", "dev")],
        )
        .with_resource(
            "sub-1",
            "rg2",
            "cache-1",
            "Microsoft.Cache/redis",
            "westus",
            &[],
        )
        .with_resource(
            "sub-1",
            "rg2",
            "cache-2",
            "Microsoft.Cache/redis",
            "westus",
            &[],
        )
        .with_providers("sub-1", &["Microsoft.Web", "Microsoft.Sql"])
}

async fn client_with_context(manager: &InMemoryResourceManager) -> ResourceClient {
    let mut client = ResourceClient::with_manager(Arc::new(manager.clone()));
    client.set_context("sub-1").await.unwrap();
    client
}

#[tokio::test]
async fn test_operations_before_context_fail_without_backend_call() {
    let manager = InMemoryResourceManager::new();
    let client = ResourceClient::with_manager(Arc::new(manager.clone()));

    assert!(matches!(
        client.get_resources_in_resource_group("rg1").await.unwrap_err(),
        ResourceError::NoContext
    ));
    assert!(matches!(
        client.get_resource_groups_by_tag("env", "prod").await.unwrap_err(),
        ResourceError::NoContext
    ));
    assert!(matches!(
        client.count_resources_by_location().await.unwrap_err(),
        ResourceError::NoContext
    ));
    assert!(matches!(
        client.list_resource_providers().await.unwrap_err(),
        ResourceError::NoContext
    ));

    // The guard fires before any backend interaction
    assert_eq!(manager.call_count(), 0);
}

#[tokio::test]
async fn test_list_subscriptions_works_without_context() {
    let manager = fixture();
    let client = ResourceClient::with_manager(Arc::new(manager));

    let subscriptions = client.list_subscriptions().await.unwrap();
    assert_eq!(subscriptions.len(), 2);
    assert!(client.context().is_none());
}

#[tokio::test]
async fn test_set_context_rejects_empty_input() {
    let manager = fixture();
    let mut client = ResourceClient::with_manager(Arc::new(manager.clone()));

    let error = client.set_context("  ").await.unwrap_err();
    assert!(matches!(error, ResourceError::InvalidArgument { .. }));
    assert_eq!(manager.call_count(), 0);
}

#[tokio::test]
async fn test_set_context_rejects_unknown_subscription() {
    let manager = fixture();
    let mut client = ResourceClient::with_manager(Arc::new(manager));

    client.set_context("sub-1").await.unwrap();
    let error = client.set_context("missing").await.unwrap_err();
    assert!(matches!(error, ResourceError::SubscriptionNotFound { .. }));

    // The previous context survives a failed switch
    assert_eq!(client.context(), Some("sub-1"));
}

#[tokio::test]
async fn test_groups_by_tag_uses_case_sensitive_equality() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let groups = client.get_resource_groups_by_tag("env", "prod").await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "rg1");

    // Values compare case-sensitively; "Prod" is not "prod"
    assert!(client
        .get_resource_groups_by_tag("env", "Prod")
        .await
        .unwrap()
        .is_empty());
    assert!(client
        .get_resource_groups_by_tag("missing", "prod")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_group_name_is_derived_from_resource_id() {
    // Queried under a differently-cased alias, the records still carry
    // the group name parsed out of each resource identifier.
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let records = client.get_resources_in_resource_group("RG1").await.unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.resource_group, "rg1");
    }
}

#[tokio::test]
async fn test_group_name_falls_back_for_malformed_ids() {
    let manager = InMemoryResourceManager::new()
        .with_subscription("sub-1", "Production")
        .with_raw_resource(
            "sub-1",
            "rg1",
            ResourceItem {
                id: "malformed-identifier".to_string(),
                name: "odd-1".to_string(),
                resource_type: "Microsoft.Test/things".to_string(),
                location: "eastus".to_string(),
                tags: std::collections::HashMap::new(),
            },
        );
    let client = client_with_context(&manager).await;

    let records = client.get_resources_in_resource_group("rg1").await.unwrap();
    assert_eq!(records[0].resource_group, "rg1");
}

#[tokio::test]
async fn test_resources_by_type_scans_all_groups() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let mut names: Vec<String> = client
        .get_resources_by_type("Microsoft.Web/sites")
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["web-1", "web-2"]);

    // Exact type-string match only
    assert!(client
        .get_resources_by_type("Microsoft.Web")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_resources_by_tags_requires_every_pair() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let mut tags = HashMap::new();
    tags.insert("env".to_string(), "prod".to_string());
    tags.insert("tier".to_string(), "frontend".to_string());

    let records = client.get_resources_by_tags(&tags).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "web-1");

    let mut just_env = HashMap::new();
    just_env.insert("env".to_string(), "prod".to_string());
    assert_eq!(client.get_resources_by_tags(&just_env).await.unwrap().len(), 2);

    assert!(client
        .get_resources_by_tags(&HashMap::new())
        .await
        .unwrap_err()
        .is_precondition());
}

#[tokio::test]
async fn test_count_resources_by_location() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let counts = client.count_resources_by_location().await.unwrap();

    let mut expected = HashMap::new();
    expected.insert("eastus".to_string(), 3);
    expected.insert("westus".to_string(), 2);
    assert_eq!(counts, expected);
}

#[tokio::test]
async fn test_list_resource_providers() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    assert_eq!(
        client.list_resource_providers().await.unwrap(),
        vec!["Microsoft.Web", "Microsoft.Sql"]
    );
}

#[tokio::test]
async fn test_resource_exists() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    assert!(client.resource_exists("rg1", "web-1").await.unwrap());
    assert!(!client.resource_exists("rg1", "web-2").await.unwrap());
    assert!(!client.resource_exists("rg1", "ghost").await.unwrap());
}

#[tokio::test]
async fn test_export_through_facade() {
    let manager = fixture();
    let client = client_with_context(&manager).await;

    let records = client.get_resources_in_resource_group("rg1").await.unwrap();
    let json = client.export_to_json(&records).unwrap();

    let parsed: Vec<ResourceRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, records);
}
