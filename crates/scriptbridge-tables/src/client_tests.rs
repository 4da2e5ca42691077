//! Tests for the table client facade.

use super::*;
use crate::providers::InMemoryTableStore;
use serde_json::Value;

fn connected_client(store: &InMemoryTableStore, table: Option<&str>) -> TableClient {
    let mut client = TableClient::new();
    client.initialize_with(
        Arc::new(store.clone()),
        table.map(|t| TableName::new(t).unwrap()),
    );
    client
}

#[tokio::test]
async fn test_operations_before_initialize_fail_without_store_call() {
    let store = InMemoryTableStore::new();
    let client = TableClient::new();
    assert!(!client.is_connected());

    assert!(matches!(
        client.list_tables().await.unwrap_err(),
        TableError::NotConnected
    ));
    assert!(matches!(
        client.get("p", "r").await.unwrap_err(),
        TableError::NotConnected
    ));
    assert!(matches!(
        client.query("RowKey eq 'r'").await.unwrap_err(),
        TableError::NotConnected
    ));

    let mut client = client;
    assert!(matches!(
        client.set_table("people").unwrap_err(),
        TableError::NotConnected
    ));

    // The guard fires before any store interaction
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_entity_operations_need_an_active_table() {
    // Account-level connection without a table: the two guard conditions
    // must stay distinguishable.
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, None);

    assert!(matches!(
        client.get("p", "r").await.unwrap_err(),
        TableError::NoTableSelected
    ));
    assert!(matches!(
        client
            .upsert(&TableEntity::new("p", "r"))
            .await
            .unwrap_err(),
        TableError::NoTableSelected
    ));
    assert!(matches!(
        client.delete("p", "r").await.unwrap_err(),
        TableError::NoTableSelected
    ));

    // list_tables needs only the account-level connection
    assert!(client.list_tables().await.is_ok());
    assert_eq!(store.call_count(), 1);
}

#[tokio::test]
async fn test_initialize_with_table_selects_it() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));
    assert_eq!(client.active_table().unwrap().as_str(), "people");
}

#[tokio::test]
async fn test_set_table_switches_active_table() {
    let store = InMemoryTableStore::new();
    let mut client = connected_client(&store, Some("people"));

    client
        .upsert(&TableEntity::new("p", "in-people"))
        .await
        .unwrap();

    client.set_table("devices").unwrap();
    client
        .upsert(&TableEntity::new("p", "in-devices"))
        .await
        .unwrap();

    assert!(client.get("p", "in-people").await.unwrap().is_none());
    assert!(client.get("p", "in-devices").await.unwrap().is_some());
}

#[tokio::test]
async fn test_get_absorbs_not_found_into_none() {
    // The point-read is the one operation that reports absence as a
    // normal value; delete below keeps the error.
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));

    let result = client.get("p", "ghost").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_missing_entity_keeps_the_error() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));

    // The exact upstream status for this case belongs to the service;
    // the in-memory store reports it as EntityNotFound.
    let error = client.delete("p", "ghost").await.unwrap_err();
    assert!(matches!(error, TableError::EntityNotFound { .. }));
}

#[tokio::test]
async fn test_upsert_get_roundtrip() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));

    let entity = TableEntity::new("p1", "r1").with_property("Name", "Ada");
    client.upsert(&entity).await.unwrap();

    let stored = client.get("p1", "r1").await.unwrap().unwrap();
    assert_eq!(stored.property("Name"), Some(&Value::from("Ada")));
}

#[tokio::test]
async fn test_empty_keys_rejected_before_store_call() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));
    let calls_before = store.call_count();

    assert!(client.get("", "r").await.unwrap_err().is_precondition());
    assert!(client.get("p", "").await.unwrap_err().is_precondition());
    assert!(client.query("  ").await.unwrap_err().is_precondition());
    assert_eq!(store.call_count(), calls_before);
}

#[tokio::test]
async fn test_check_existence_issues_one_query_per_key() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));

    client.upsert(&TableEntity::new("p", "alpha")).await.unwrap();
    client.upsert(&TableEntity::new("p", "gamma")).await.unwrap();

    let candidates = vec![
        "alpha".to_string(),
        "beta".to_string(),
        "gamma".to_string(),
    ];
    let queries_before = store.query_count();
    let existing = client.check_existence(&candidates).await.unwrap();

    assert_eq!(existing, vec!["alpha", "gamma"]);
    assert_eq!(store.query_count() - queries_before, 3);
}

#[tokio::test]
async fn test_check_existence_escapes_quoted_keys() {
    let store = InMemoryTableStore::new();
    let client = connected_client(&store, Some("people"));

    client
        .upsert(&TableEntity::new("p", "O'Brien"))
        .await
        .unwrap();

    let existing = client
        .check_existence(&["O'Brien".to_string()])
        .await
        .unwrap();
    assert_eq!(existing, vec!["O'Brien"]);
}
