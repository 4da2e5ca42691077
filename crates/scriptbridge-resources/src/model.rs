//! Resource records, subscription and group info, identifier parsing,
//! and JSON export.

use crate::error::ResourceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

// ============================================================================
// Records
// ============================================================================

/// One resource as reported to the host
///
/// A plain value constructed fresh per query result; its only identity is
/// the resource identifier. Serialized field order follows the
/// declaration order below and is part of the export contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub id: String,
    pub resource_type: String,
    pub location: String,
    pub resource_group: String,
}

/// A subscription visible to the authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub id: String,
    pub display_name: String,
}

/// A resource group within a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    pub name: String,
    pub location: String,
    pub tags: HashMap<String, String>,
}

/// A resource as reported by the management backend, before the facade
/// re-derives its owning group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub id: String,
    pub name: String,
    pub resource_type: String,
    pub location: String,
    pub tags: HashMap<String, String>,
}

// ============================================================================
// Identifier parsing
// ============================================================================

/// Extract the owning resource-group name from a hierarchical resource
/// identifier
///
/// Identifiers follow the management API's path grammar:
/// `/subscriptions/{id}/resourceGroups/{name}/providers/...`; the group
/// name sits at a fixed segment position. Returns `None` when the
/// identifier does not carry that shape.
pub fn resource_group_from_id(id: &str) -> Option<&str> {
    let segments: Vec<&str> = id.split('/').collect();

    if segments.len() > 4
        && segments[0].is_empty()
        && segments[1].eq_ignore_ascii_case("subscriptions")
        && segments[3].eq_ignore_ascii_case("resourcegroups")
        && !segments[4].is_empty()
    {
        Some(segments[4])
    } else {
        None
    }
}

// ============================================================================
// JSON export
// ============================================================================

/// Serialize resource records as human-readable JSON
///
/// Field order is stable (declaration order) and the output is indented.
pub fn export_to_json(records: &[ResourceRecord]) -> Result<String, ResourceError> {
    serde_json::to_string_pretty(records)
        .map_err(|e| ResourceError::upstream("export_to_json", e.to_string()))
}

/// Write resource records to a file as UTF-8 JSON, replacing any
/// existing content wholesale
pub async fn save_to_json_file(
    records: &[ResourceRecord],
    path: &Path,
) -> Result<(), ResourceError> {
    let json = export_to_json(records)?;

    tokio::fs::write(path, json.as_bytes())
        .await
        .map_err(|e| ResourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    info!(path = %path.display(), count = records.len(), "Resource records written");
    Ok(())
}
