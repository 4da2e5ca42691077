//! Tests for records, identifier parsing, and JSON export.

use super::*;

fn record(name: &str, location: &str) -> ResourceRecord {
    ResourceRecord {
        name: name.to_string(),
        id: format!("/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Test/things/{name}"),
        resource_type: "Microsoft.Test/things".to_string(),
        location: location.to_string(),
        resource_group: "rg1".to_string(),
    }
}

// ============================================================================
// Identifier parsing
// ============================================================================

#[test]
fn test_resource_group_from_id_extracts_fourth_segment() {
    let id = "/subscriptions/S/resourceGroups/rg1/providers/X/Y";
    assert_eq!(resource_group_from_id(id), Some("rg1"));
}

#[test]
fn test_resource_group_from_id_accepts_cased_markers() {
    let id = "/Subscriptions/S/ResourceGroups/Prod-RG/providers/X/Y";
    assert_eq!(resource_group_from_id(id), Some("Prod-RG"));
}

#[test]
fn test_resource_group_from_id_rejects_malformed_ids() {
    assert_eq!(resource_group_from_id(""), None);
    assert_eq!(resource_group_from_id("not-a-path"), None);
    assert_eq!(resource_group_from_id("/subscriptions/S"), None);
    assert_eq!(resource_group_from_id("/subscriptions/S/resourceGroups/"), None);
    // Provider-level id with no group segment
    assert_eq!(
        resource_group_from_id("/subscriptions/S/providers/Microsoft.Test"),
        None
    );
}

// ============================================================================
// JSON export
// ============================================================================

#[test]
fn test_export_is_indented_with_stable_field_order() {
    let json = export_to_json(&[record("web-1", "eastus")]).unwrap();

    // Human-readable formatting
    assert!(json.contains('\n'));
    assert!(json.starts_with('['));

    // Declaration order: name, id, resource_type, location, resource_group
    let positions: Vec<usize> = ["\"name\"", "\"id\"", "\"resource_type\"", "\"location\"", "\"resource_group\""]
        .iter()
        .map(|field| json.find(field).unwrap())
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_export_of_empty_sequence_is_an_empty_array() {
    assert_eq!(export_to_json(&[]).unwrap(), "[]");
}

#[tokio::test]
async fn test_save_to_json_file_overwrites_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resources.json");

    save_to_json_file(&[record("a", "eastus"), record("b", "westus")], &path)
        .await
        .unwrap();

    // A second save replaces the previous content entirely
    save_to_json_file(&[record("c", "eastus")], &path)
        .await
        .unwrap();

    let written = tokio::fs::read_to_string(&path).await.unwrap();
    let parsed: Vec<ResourceRecord> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].name, "c");
}

#[tokio::test]
async fn test_save_to_unwritable_path_reports_io_error() {
    let error = save_to_json_file(&[], Path::new("/nonexistent-dir/out.json"))
        .await
        .unwrap_err();
    assert!(matches!(error, ResourceError::Io { .. }));
}
