//! Tests for the in-memory management backend.

use super::*;

fn fixture() -> InMemoryResourceManager {
    InMemoryResourceManager::new()
        .with_subscription("sub-1", "Production")
        .with_group("sub-1", "rg1", "eastus", &[("env", "prod")])
        .with_resource("sub-1", "rg1", "web-1", "Microsoft.Web/sites", "eastus", &[])
        .with_providers("sub-1", &["Microsoft.Web", "Microsoft.Storage"])
}

#[tokio::test]
async fn test_subscription_resolution() {
    let manager = fixture();

    let all = manager.list_subscriptions().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].display_name, "Production");

    assert!(manager.get_subscription("sub-1").await.unwrap().is_some());
    assert!(manager.get_subscription("sub-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_group_lookup_is_case_insensitive() {
    let manager = fixture();

    let exact = manager.list_resources("sub-1", "rg1").await.unwrap();
    let cased = manager.list_resources("sub-1", "RG1").await.unwrap();
    assert_eq!(exact, cased);
    assert_eq!(exact.len(), 1);

    // The registered identifier keeps the canonical group casing
    assert!(exact[0].id.contains("/resourceGroups/rg1/"));
}

#[tokio::test]
async fn test_unknown_scopes_list_empty() {
    let manager = fixture();

    assert!(manager
        .list_resource_groups("sub-2")
        .await
        .unwrap()
        .is_empty());
    assert!(manager
        .list_resources("sub-1", "ghost")
        .await
        .unwrap()
        .is_empty());
    assert!(manager.list_providers("sub-2").await.unwrap().is_empty());
}
