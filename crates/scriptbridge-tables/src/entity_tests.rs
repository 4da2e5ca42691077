//! Tests for table names, entities, and filter helpers.

use super::*;

#[test]
fn test_table_name_validation() {
    assert!(TableName::new("people").is_ok());
    assert!(TableName::new("Audit2024").is_ok());

    assert!(TableName::new("ab").is_err()); // too short
    assert!(TableName::new("a".repeat(64)).is_err()); // too long
    assert!(TableName::new("9lives").is_err()); // must start with a letter
    assert!(TableName::new("with-hyphen").is_err());
}

#[test]
fn test_entity_property_roundtrip() {
    let entity = TableEntity::new("devices", "sensor-1")
        .with_property("Location", "eastus")
        .with_property("Reading", 42);

    assert_eq!(entity.partition_key, "devices");
    assert_eq!(entity.row_key, "sensor-1");
    assert_eq!(
        entity.property("Location"),
        Some(&Value::String("eastus".to_string()))
    );
    assert_eq!(entity.property("Reading"), Some(&Value::from(42)));
    assert_eq!(entity.property("Missing"), None);
}

#[test]
fn test_escape_filter_value_doubles_single_quotes() {
    assert_eq!(escape_filter_value("plain"), "plain");
    assert_eq!(escape_filter_value("O'Brien"), "O''Brien");
    assert_eq!(escape_filter_value("''"), "''''");
}
