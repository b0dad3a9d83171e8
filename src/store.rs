//! Persistent counters and settings behind a key-value contract.
//!
//! The core keeps no durable state of its own. Session counters and
//! settings live behind [`KeyValueStore`], a partial-map get/set contract
//! any host storage can satisfy. [`MemoryStore`] is the bundled in-memory
//! implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Key for the found-links counter.
pub const KEY_FOUND_LINKS: &str = "found_links";
/// Key for the total-downloads counter.
pub const KEY_TOTAL_DOWNLOADS: &str = "total_downloads";
/// Key for the processed-files counter.
pub const KEY_PROCESSED_FILES: &str = "processed_files";

/// Key-value storage contract.
///
/// `get` returns a partial map containing only the requested keys that
/// exist; `set` upserts every entry in the map.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored values for the requested keys that exist.
    fn get(&self, keys: &[&str]) -> HashMap<String, Value>;

    /// Stores every entry, overwriting existing keys.
    fn set(&self, entries: HashMap<String, Value>);
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> HashMap<String, Value> {
        let inner = self.lock();
        keys.iter()
            .filter_map(|key| inner.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect()
    }

    fn set(&self, entries: HashMap<String, Value>) {
        self.lock().extend(entries);
    }
}

/// Seeds `defaults` into the store, setting only keys that are absent.
/// Existing values are never overwritten.
pub fn seed_defaults(store: &dyn KeyValueStore, defaults: HashMap<String, Value>) {
    let keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
    let existing = store.get(&keys);

    let missing: HashMap<String, Value> = defaults
        .into_iter()
        .filter(|(key, _)| !existing.contains_key(key))
        .collect();

    if !missing.is_empty() {
        debug!(count = missing.len(), "seeding default store keys");
        store.set(missing);
    }
}

/// Session usage counters, persisted through the key-value store.
///
/// All counters start at zero. The orchestrator never touches these; the
/// command layer reads, bumps, and writes them back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    /// Candidate links discovered by scans.
    pub found_links: u64,
    /// Downloads successfully submitted.
    pub total_downloads: u64,
    /// Files processed (academic pipeline).
    pub processed_files: u64,
}

impl UsageCounters {
    /// Loads counters from the store; missing keys read as zero.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let values = store.get(&[KEY_FOUND_LINKS, KEY_TOTAL_DOWNLOADS, KEY_PROCESSED_FILES]);
        let read = |key: &str| values.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            found_links: read(KEY_FOUND_LINKS),
            total_downloads: read(KEY_TOTAL_DOWNLOADS),
            processed_files: read(KEY_PROCESSED_FILES),
        }
    }

    /// Writes all three counters back to the store.
    pub fn save(&self, store: &dyn KeyValueStore) {
        store.set(HashMap::from([
            (KEY_FOUND_LINKS.to_string(), Value::from(self.found_links)),
            (
                KEY_TOTAL_DOWNLOADS.to_string(),
                Value::from(self.total_downloads),
            ),
            (
                KEY_PROCESSED_FILES.to_string(),
                Value::from(self.processed_files),
            ),
        ]));
    }
}
