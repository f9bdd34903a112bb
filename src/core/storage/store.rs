// src/core/storage/store.rs

//! The shared key-value store.
//!
//! All entries live in a single `HashMap` behind a `parking_lot::RwLock`: reads
//! (`get`, `keys`, snapshots) share the lock, writes (`set`, `delete`) take it
//! exclusively. Every individual call is therefore linearizable, and a snapshot
//! is one consistent pass over the mapping.

use crate::core::MemoryDbError;
use crate::core::persistence::snapshot;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// A point-in-time copy of the whole mapping.
pub type Entries = HashMap<String, Value>;

/// The concurrent key-value store shared by every session.
#[derive(Debug, Default)]
pub struct Store {
    entries: RwLock<Entries>,
    /// Mutations since the last successful save.
    dirty: AtomicU64,
}

/// Normalizes a key to its stored form.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Renders a stored value the way it is sent back to clients.
///
/// Strings are returned verbatim; anything else that came in through a
/// snapshot is shown in its JSON form.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-decoded entries, normalizing keys and
    /// dropping empty ones.
    ///
    /// Keys that differ only in case collapse into one entry. The key already
    /// in lowercase wins, otherwise the lexicographically smallest one.
    pub fn from_entries(entries: Entries) -> Self {
        let mut ordered: Vec<(String, Value)> = entries.into_iter().collect();
        ordered.sort_by(|(a, _), (b, _)| {
            (normalize_key(a) != *a, a).cmp(&(normalize_key(b) != *b, b))
        });

        let mut normalized = HashMap::with_capacity(ordered.len());
        for (key, value) in ordered {
            if key.is_empty() {
                warn!("Skipping snapshot entry with an empty key.");
                continue;
            }
            let stored_key = normalize_key(&key);
            if normalized.contains_key(&stored_key) {
                warn!(
                    "Snapshot key '{}' collides with '{}' once lowercased; keeping the earlier entry.",
                    key, stored_key
                );
                continue;
            }
            normalized.insert(stored_key, value);
        }
        Self {
            entries: RwLock::new(normalized),
            dirty: AtomicU64::new(0),
        }
    }

    /// Inserts or overwrites a key. Last write wins.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        self.entries.write().insert(normalize_key(key), value);
        self.dirty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(&normalize_key(key)).cloned()
    }

    /// Removes a key. Returns whether a key was actually removed; removing an
    /// absent key is a no-op.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(&normalize_key(key)).is_some();
        if removed {
            self.dirty.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Returns the keys held at call time, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clones the full mapping under a single read-lock acquisition.
    pub fn snapshot(&self) -> Entries {
        self.entries.read().clone()
    }

    /// The number of mutations since the last successful save.
    pub fn dirty_count(&self) -> u64 {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Loads the store from a snapshot file.
    ///
    /// A missing file yields an empty store. So does a malformed one, with a
    /// warning: startup never fails because of the snapshot.
    pub async fn load(path: &Path) -> Self {
        match snapshot::read_snapshot(path).await {
            Ok(Some(entries)) => {
                let store = Self::from_entries(entries);
                info!(
                    "Loaded {} keys from snapshot {}.",
                    store.len(),
                    path.display()
                );
                store
            }
            Ok(None) => {
                info!(
                    "No snapshot found at {}. Starting with an empty store.",
                    path.display()
                );
                Self::new()
            }
            Err(e) => {
                warn!(
                    "Could not load snapshot {}: {}. Starting with an empty store.",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Writes the current mapping to the snapshot file, overwriting it.
    ///
    /// Returns the number of keys written. The dirty counter is reduced by the
    /// mutations observed when the snapshot was taken, so writes racing with the
    /// save keep the store dirty.
    pub async fn save(&self, path: &Path) -> Result<usize, MemoryDbError> {
        let (entries, dirty_at_start) = {
            let guard = self.entries.read();
            (guard.clone(), self.dirty.load(Ordering::Relaxed))
        };
        snapshot::write_snapshot(&entries, path).await?;
        let _ = self
            .dirty
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(dirty_at_start))
            });
        Ok(entries.len())
    }
}
