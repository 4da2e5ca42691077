//! Tests for secret names, values, and the store facade.

use super::*;
use crate::providers::InMemorySecretVault;

fn ready_store() -> (SecretStore, InMemorySecretVault) {
    let vault = InMemorySecretVault::new();
    let mut store = SecretStore::new();
    store.initialize_with(Arc::new(vault.clone()));
    (store, vault)
}

// ============================================================================
// SecretName
// ============================================================================

#[test]
fn test_secret_name_validation() {
    assert!(SecretName::new("service-prod-api-key").is_ok());
    assert!(SecretName::new("a").is_ok());

    assert!(SecretName::new("").is_err());
    assert!(SecretName::new("no_underscores").is_err());
    assert!(SecretName::new("no spaces").is_err());
    assert!(SecretName::new("a".repeat(128)).is_err());
}

#[test]
fn test_secret_name_parses_from_str() {
    let name: SecretName = "webhook-token".parse().unwrap();
    assert_eq!(name.as_str(), "webhook-token");
}

// ============================================================================
// SecretValue
// ============================================================================

#[test]
fn test_secret_value_debug_is_redacted() {
    let value = SecretValue::new("sensitive-data");

    let debug_output = format!("{:?}", value);
    assert!(!debug_output.contains("sensitive-data"));
    assert!(debug_output.contains("[REDACTED]"));

    assert_eq!(value.len(), 14);
    assert!(!value.is_empty());
}

// ============================================================================
// SecretStore facade
// ============================================================================

#[tokio::test]
async fn test_operations_before_initialize_fail_without_backend_call() {
    let vault = InMemorySecretVault::new();
    let store = SecretStore::new();
    assert!(!store.is_initialized());

    assert!(matches!(
        store.list().await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));
    assert!(matches!(
        store.get("anything").await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));
    assert!(matches!(
        store.set("anything", SecretValue::new("v")).await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));
    assert!(matches!(
        store.delete("anything").await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));
    assert!(matches!(
        store.purge("anything").await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));
    assert!(matches!(
        store.recover("anything").await.unwrap_err(),
        SecretStoreError::NotInitialized
    ));

    // The guard fires before any backend interaction
    assert_eq!(vault.call_count(), 0);
}

#[tokio::test]
async fn test_initialize_rejects_empty_endpoint() {
    let mut store = SecretStore::new();
    let error = store.initialize("   ").await.unwrap_err();
    assert!(matches!(
        error,
        SecretStoreError::InvalidArgument { ref field, .. } if field == "endpoint"
    ));
    assert!(!store.is_initialized());
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_backend_call() {
    let (store, vault) = ready_store();

    let error = store.get("").await.unwrap_err();
    assert!(error.is_precondition());

    let error = store.get("bad name!").await.unwrap_err();
    assert!(error.is_precondition());

    assert_eq!(vault.call_count(), 0);
}

#[tokio::test]
async fn test_set_get_list_through_facade() {
    let (store, _vault) = ready_store();

    store.set("api-key", SecretValue::new("v1")).await.unwrap();
    store.set("conn-str", SecretValue::new("v2")).await.unwrap();

    assert_eq!(store.get("api-key").await.unwrap().expose_secret(), "v1");

    let mut names: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.as_str().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["api-key", "conn-str"]);
}

#[tokio::test]
async fn test_get_missing_secret_is_not_found() {
    let (store, _vault) = ready_store();
    assert!(store.get("ghost").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_then_purge_ordering() {
    // Delete waits for the simulated service to settle, so the purge
    // issued immediately afterwards must observe the deleted state.
    let vault = InMemorySecretVault::with_delete_settle_polls(4);
    let mut store = SecretStore::new();
    store.initialize_with(Arc::new(vault.clone()));

    store.set("x", SecretValue::new("value")).await.unwrap();
    store.delete("x").await.unwrap();

    assert!(vault.is_soft_deleted(&SecretName::new("x").unwrap()));
    store.purge("x").await.unwrap();
    assert!(store.get("x").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_then_recover_restores_secret() {
    let (store, _vault) = ready_store();

    store.set("x", SecretValue::new("keep-me")).await.unwrap();
    store.delete("x").await.unwrap();
    store.recover("x").await.unwrap();

    assert_eq!(store.get("x").await.unwrap().expose_secret(), "keep-me");
}
