//! Tests for the plugin registry.

use super::*;

#[test]
fn test_plugin_id_validation() {
    assert!(PluginId::new("secret-store").is_ok());
    assert!(PluginId::new("my_plugin2").is_ok());

    assert!(PluginId::new("").is_err());
    assert!(PluginId::new("SecretStore").is_err()); // uppercase not allowed
    assert!(PluginId::new("../escape").is_err()); // slashes not allowed
}

#[test]
fn test_builtin_registry_lists_all_facades() {
    let registry = PluginRegistry::builtin();

    assert_eq!(
        registry.ids(),
        vec![
            "queue-client",
            "resource-client",
            "secret-store",
            "table-client"
        ]
    );
    assert!(registry.contains("secret-store"));
    assert!(!registry.contains("unknown"));
}

#[test]
fn test_register_replaces_existing_descriptor() {
    let mut registry = PluginRegistry::new();
    let id = PluginId::new("custom").unwrap();

    registry.register(PluginDescriptor::new(id.clone(), "first"));
    registry.register(PluginDescriptor::new(id, "second"));

    assert_eq!(registry.get("custom").unwrap().summary, "second");
    assert_eq!(registry.ids().len(), 1);
}

#[test]
fn test_get_unknown_plugin_returns_none() {
    let registry = PluginRegistry::new();
    assert!(registry.get("missing").is_none());
}
