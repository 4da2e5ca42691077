//! Plugin registry for host-side facade discovery.
//!
//! This module provides [`PluginRegistry`] for associating named plugins
//! (e.g. `"secret-store"`) with their [`PluginDescriptor`]s. The registry
//! is built once at host startup and used read-only while scripts run;
//! the host looks up a descriptor by id and asks its own dependency
//! injection to produce the matching facade.

use std::collections::HashMap;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// ============================================================================
// PluginId
// ============================================================================

/// Identifier for a plugin exposed to the host.
///
/// A plugin ID must consist entirely of lowercase ASCII letters, digits,
/// hyphens (`-`), or underscores (`_`). It must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId(String);

impl PluginId {
    /// Create a new `PluginId`, validating it contains only safe
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPluginIdError::Empty`] if the value is empty.
    /// Returns [`InvalidPluginIdError::InvalidChars`] if the value
    /// contains characters outside `[a-z0-9\-_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidPluginIdError> {
        let s = value.into();
        if s.is_empty() {
            return Err(InvalidPluginIdError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(InvalidPluginIdError::InvalidChars { value: s });
        }
        Ok(Self(s))
    }

    /// Return the plugin ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PluginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// InvalidPluginIdError
// ============================================================================

/// Error returned when a [`PluginId`] cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum InvalidPluginIdError {
    /// Plugin ID must not be empty.
    #[error("Plugin ID must not be empty")]
    Empty,

    /// Plugin ID contains characters outside `[a-z0-9\\-_]`.
    #[error(
        "Plugin ID '{value}' contains invalid characters; \
         use lowercase alphanumeric, hyphens, or underscores"
    )]
    InvalidChars { value: String },
}

// ============================================================================
// PluginDescriptor
// ============================================================================

/// Description of one facade plugin the host can instantiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: PluginId,
    pub summary: String,
}

impl PluginDescriptor {
    /// Create a descriptor.
    pub fn new(id: PluginId, summary: impl Into<String>) -> Self {
        Self {
            id,
            summary: summary.into(),
        }
    }
}

// ============================================================================
// PluginRegistry
// ============================================================================

/// Registry mapping plugin IDs to their descriptors.
///
/// Built once at host startup and used read-only afterwards.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginDescriptor>,
}

impl PluginRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in facade plugins.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtin = [
            ("secret-store", "Key Vault secret operations"),
            ("queue-client", "Service Bus queue operations"),
            ("table-client", "Table Storage entity operations"),
            ("resource-client", "Resource Manager queries and export"),
        ];
        for (id, summary) in builtin {
            let id = PluginId::new(id).expect("built-in plugin ids are valid");
            registry.register(PluginDescriptor::new(id, summary));
        }
        registry
    }

    /// Register a plugin descriptor.
    ///
    /// If a plugin with the same ID is already registered it is replaced.
    /// Returns `&mut Self` to allow method chaining.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> &mut Self {
        self.plugins
            .insert(descriptor.id.as_str().to_string(), descriptor);
        self
    }

    /// Look up a descriptor by plugin id.
    ///
    /// Returns `None` if the plugin is not registered.
    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(id)
    }

    /// Check whether a plugin is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// All registered plugin ids, sorted for stable enumeration.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
