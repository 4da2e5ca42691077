//! In-memory vault backend for testing and development.
//!
//! Fully functional implementation of [`SecretVault`] backed by hash
//! maps, including the soft-delete / purge / recover lifecycle. A delete
//! settles only after a configurable number of status polls, which gives
//! tests a deterministic stand-in for the service-side wait the Azure
//! backend performs.

use crate::error::SecretStoreError;
use crate::store::{SecretName, SecretValue, SecretVault};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Outcome of one status poll against a pending delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteState {
    InProgress,
    Deleted,
}

/// Backing storage shared by clones of the vault
struct VaultBackend {
    active: HashMap<SecretName, SecretValue>,
    deleted: HashMap<SecretName, SecretValue>,
    /// Pending deletes and the number of polls left before they settle
    deleting: HashMap<SecretName, u32>,
    delete_polls_observed: u32,
    calls: u64,
}

/// Thread-safe in-memory secret vault
#[derive(Clone)]
pub struct InMemorySecretVault {
    backend: Arc<RwLock<VaultBackend>>,
    settle_polls: u32,
}

impl InMemorySecretVault {
    /// Create a new empty vault whose deletes settle on the first poll
    pub fn new() -> Self {
        Self::with_delete_settle_polls(0)
    }

    /// Create a vault whose deletes report in-progress for `settle_polls`
    /// status polls before becoming terminal
    pub fn with_delete_settle_polls(settle_polls: u32) -> Self {
        Self {
            backend: Arc::new(RwLock::new(VaultBackend {
                active: HashMap::new(),
                deleted: HashMap::new(),
                deleting: HashMap::new(),
                delete_polls_observed: 0,
                calls: 0,
            })),
            settle_polls,
        }
    }

    /// Create a vault pre-populated with secrets
    pub fn with_secrets(secrets: HashMap<SecretName, SecretValue>) -> Self {
        let vault = Self::new();
        vault.backend.write().unwrap().active.extend(secrets);
        vault
    }

    /// Number of backend operations invoked so far
    ///
    /// Used by guard tests to verify that precondition failures never
    /// reach the backend.
    pub fn call_count(&self) -> u64 {
        self.backend.read().unwrap().calls
    }

    /// Number of delete status polls observed so far
    pub fn delete_polls_observed(&self) -> u32 {
        self.backend.read().unwrap().delete_polls_observed
    }

    /// Check whether a secret currently sits in the soft-deleted state
    pub fn is_soft_deleted(&self, name: &SecretName) -> bool {
        self.backend.read().unwrap().deleted.contains_key(name)
    }

    /// Check whether a secret is active
    pub fn contains(&self, name: &SecretName) -> bool {
        self.backend.read().unwrap().active.contains_key(name)
    }

    fn record_call(&self) {
        self.backend.write().unwrap().calls += 1;
    }

    /// Poll the simulated service for the state of a pending delete
    fn poll_delete_state(&self, name: &SecretName) -> DeleteState {
        let mut backend = self.backend.write().unwrap();
        backend.delete_polls_observed += 1;

        match backend.deleting.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                DeleteState::InProgress
            }
            Some(_) => {
                backend.deleting.remove(name);
                if let Some(value) = backend.active.remove(name) {
                    backend.deleted.insert(name.clone(), value);
                }
                DeleteState::Deleted
            }
            None => DeleteState::Deleted,
        }
    }
}

impl Default for InMemorySecretVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretVault for InMemorySecretVault {
    async fn list_names(&self) -> Result<Vec<SecretName>, SecretStoreError> {
        self.record_call();
        Ok(self
            .backend
            .read()
            .unwrap()
            .active
            .keys()
            .cloned()
            .collect())
    }

    async fn get(&self, name: &SecretName) -> Result<SecretValue, SecretStoreError> {
        self.record_call();
        self.backend
            .read()
            .unwrap()
            .active
            .get(name)
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound {
                name: name.to_string(),
            })
    }

    async fn set(&self, name: &SecretName, value: &SecretValue) -> Result<(), SecretStoreError> {
        self.record_call();
        self.backend
            .write()
            .unwrap()
            .active
            .insert(name.clone(), value.clone());
        Ok(())
    }

    async fn delete(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        self.record_call();

        {
            let mut backend = self.backend.write().unwrap();
            if !backend.active.contains_key(name) {
                return Err(SecretStoreError::NotFound {
                    name: name.to_string(),
                });
            }
            backend.deleting.insert(name.clone(), self.settle_polls);
        }

        // Mirror the Azure backend: keep polling until the service
        // reports the delete as terminal, then return.
        loop {
            if self.poll_delete_state(name) == DeleteState::Deleted {
                return Ok(());
            }
            tokio::task::yield_now().await;
        }
    }

    async fn purge(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        self.record_call();
        self.backend
            .write()
            .unwrap()
            .deleted
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SecretStoreError::NotFound {
                name: name.to_string(),
            })
    }

    async fn recover(&self, name: &SecretName) -> Result<(), SecretStoreError> {
        self.record_call();
        let mut backend = self.backend.write().unwrap();
        match backend.deleted.remove(name) {
            Some(value) => {
                backend.active.insert(name.clone(), value);
                Ok(())
            }
            None => Err(SecretStoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}
