//! Tests for the in-memory vault backend.

use super::*;

fn name(s: &str) -> SecretName {
    SecretName::new(s).unwrap()
}

#[tokio::test]
async fn test_set_get_roundtrip() {
    let vault = InMemorySecretVault::new();
    let secret = name("api-key");

    assert!(vault.get(&secret).await.unwrap_err().is_not_found());

    vault
        .set(&secret, &SecretValue::new("s3cr3t"))
        .await
        .unwrap();
    let value = vault.get(&secret).await.unwrap();
    assert_eq!(value.expose_secret(), "s3cr3t");

    // Set again replaces the value
    vault
        .set(&secret, &SecretValue::new("rotated"))
        .await
        .unwrap();
    assert_eq!(vault.get(&secret).await.unwrap().expose_secret(), "rotated");
}

#[tokio::test]
async fn test_list_names_returns_active_secrets_only() {
    let mut secrets = HashMap::new();
    secrets.insert(name("first"), SecretValue::new("1"));
    secrets.insert(name("second"), SecretValue::new("2"));
    let vault = InMemorySecretVault::with_secrets(secrets);

    vault.delete(&name("first")).await.unwrap();

    let names = vault.list_names().await.unwrap();
    assert_eq!(names, vec![name("second")]);
}

#[tokio::test]
async fn test_delete_settles_after_configured_polls() {
    let vault = InMemorySecretVault::with_delete_settle_polls(3);
    let secret = name("doomed");
    vault.set(&secret, &SecretValue::new("x")).await.unwrap();

    vault.delete(&secret).await.unwrap();

    // Three in-progress polls plus the terminal one
    assert_eq!(vault.delete_polls_observed(), 4);
    assert!(vault.is_soft_deleted(&secret));
    assert!(!vault.contains(&secret));
}

#[tokio::test]
async fn test_purge_immediately_after_delete_succeeds() {
    let vault = InMemorySecretVault::with_delete_settle_polls(5);
    let secret = name("doomed");
    vault.set(&secret, &SecretValue::new("x")).await.unwrap();

    vault.delete(&secret).await.unwrap();
    vault.purge(&secret).await.unwrap();

    assert!(!vault.is_soft_deleted(&secret));
    assert!(vault.get(&secret).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_recover_restores_active_state() {
    let vault = InMemorySecretVault::new();
    let secret = name("phoenix");
    vault.set(&secret, &SecretValue::new("rise")).await.unwrap();

    vault.delete(&secret).await.unwrap();
    assert!(vault.get(&secret).await.unwrap_err().is_not_found());

    vault.recover(&secret).await.unwrap();
    assert_eq!(vault.get(&secret).await.unwrap().expose_secret(), "rise");
}

#[tokio::test]
async fn test_delete_missing_secret_is_not_found() {
    let vault = InMemorySecretVault::new();
    assert!(vault.delete(&name("ghost")).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_purge_without_delete_is_not_found() {
    let vault = InMemorySecretVault::new();
    let secret = name("still-active");
    vault.set(&secret, &SecretValue::new("x")).await.unwrap();

    // Purge only applies to soft-deleted secrets
    assert!(vault.purge(&secret).await.unwrap_err().is_not_found());
    assert!(vault.contains(&secret));
}
