//! In-memory credential sets.
//!
//! Two namespaces: ephemeral tokens minted at runtime (API keys, OAuth access
//! tokens) and operator-provisioned admin keys. Verification is membership in
//! either set. Admin mutations are flushed to an optional [`KeyPersistence`]
//! after the set lock is released.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::persistence::KeyPersistence;
use crate::utils::mask_key;

pub struct CredentialStore {
    ephemeral: RwLock<HashSet<String>>,
    admin: RwLock<HashSet<String>>,
    persistence: Option<Arc<dyn KeyPersistence>>,
    /// Serializes flushes so the last writer always holds the latest snapshot.
    flush_lock: Mutex<()>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            ephemeral: RwLock::new(HashSet::new()),
            admin: RwLock::new(HashSet::new()),
            persistence: None,
            flush_lock: Mutex::new(()),
        }
    }

    /// Flush admin key changes through `persistence`.
    pub fn with_persistence(mut self, persistence: Arc<dyn KeyPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Seed admin keys without triggering a flush (startup load).
    pub fn with_admin_keys<I>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.admin.write().extend(keys);
        self
    }

    pub fn add_ephemeral(&self, token: impl Into<String>) {
        self.ephemeral.write().insert(token.into());
    }

    pub fn add_admin(&self, key: impl Into<String>) {
        let key = key.into();
        tracing::info!(key = %mask_key(&key), "Admin API key added");
        self.admin.write().insert(key);
        self.flush();
    }

    /// Removes `key` if present; absent keys are not an error.
    pub fn remove_admin(&self, key: &str) {
        let removed = self.admin.write().remove(key);
        tracing::info!(key = %mask_key(key), removed, "Admin API key removed");
        self.flush();
    }

    /// Snapshot of admin keys, sorted for stable output.
    pub fn list_admin(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.admin.read().iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of ephemeral tokens, sorted for stable output.
    pub fn list_ephemeral(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.ephemeral.read().iter().cloned().collect();
        tokens.sort();
        tokens
    }

    pub fn verify(&self, candidate: &str) -> bool {
        self.ephemeral.read().contains(candidate) || self.admin.read().contains(candidate)
    }

    /// Empties the ephemeral set and returns how many tokens it held.
    pub fn clear_ephemeral(&self) -> usize {
        let drained = std::mem::take(&mut *self.ephemeral.write());
        drained.len()
    }

    fn flush(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };

        let _guard = self.flush_lock.lock();
        let snapshot = self.list_admin();

        if let Err(e) = persistence.persist(&snapshot) {
            tracing::warn!(error = %e, keys = snapshot.len(), "Failed to persist admin API keys");
        }
    }
}
