//! Fault-absorbing accessor over the host key-value store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages and state modules persist drafts, cached identity, and preferences
//! through this accessor instead of repeating `web-sys` glue. The host store
//! may be missing entirely (SSR, native tests) or may throw at any time
//! (quota, privacy mode), so every public method here returns a plain value.
//!
//! ERROR HANDLING
//! ==============
//! Two surfaces share one implementation:
//! - `try_*` methods return `Result<_, StorageFault>` for callers that need to
//!   tell "never set" from "write failed".
//! - The remaining methods absorb every fault into a documented fallback
//!   (default value, `false`, empty collection) and log a warning with the key.
//!
//! TRADE-OFFS
//! ==========
//! Usage accounting sums value byte lengths only. Key names and host encoding
//! overhead are ignored, so it is an estimate, not a remaining-capacity check.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::storage_backend::{MemoryStorage, StorageBackend, StorageFault};
use crate::config::StorageConfig;

/// Approximate footprint of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StorageUsage {
    /// Sum of stored value lengths in bytes.
    pub used: u64,
    /// Accounting ceiling; zero when the store is unavailable.
    pub total: u64,
    /// `used / total * 100`, or zero when `total` is zero.
    pub percentage: f64,
}

/// Per-key result of [`SafeStorage::get_batch`]. `None` marks an absent or
/// unreadable key.
pub type BatchResult = BTreeMap<String, Option<String>>;

/// Fault-absorbing facade over a [`StorageBackend`].
///
/// `backend` is `None` when the host has no window context; every operation
/// then returns its fallback.
pub struct SafeStorage<B = MemoryStorage> {
    backend: Option<B>,
    config: StorageConfig,
}

impl SafeStorage<MemoryStorage> {
    /// Accessor with no host store behind it.
    #[must_use]
    pub fn detached() -> Self {
        Self { backend: None, config: StorageConfig::default() }
    }

    /// Accessor over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

#[cfg(feature = "hydrate")]
impl SafeStorage<super::storage_backend::BrowserStorage> {
    /// Accessor over `window.localStorage`; detached when no window exists.
    pub fn browser() -> Self {
        Self { backend: super::storage_backend::BrowserStorage::from_window(), config: StorageConfig::default() }
    }
}

impl<B: StorageBackend> SafeStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend: Some(backend), config: StorageConfig::default() }
    }

    #[must_use]
    pub fn with_config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Borrow the backend, if a host context exists.
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    fn store(&self) -> Result<&B, StorageFault> {
        self.backend.as_ref().ok_or(StorageFault::Unavailable)
    }

    // =========================================================================
    // FAULT-REPORTING OPERATIONS
    // =========================================================================

    /// Read `key`, surfacing faults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFault::Unavailable`] without a host store, or the
    /// backend's fault.
    pub fn try_get(&self, key: &str) -> Result<Option<String>, StorageFault> {
        self.store()?.get_item(key)
    }

    /// Write `key`, surfacing faults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFault::Unavailable`] without a host store, or the
    /// backend's fault (quota, denied, access).
    pub fn try_set(&self, key: &str, value: &str) -> Result<(), StorageFault> {
        self.store()?.set_item(key, value)
    }

    /// Delete `key`, surfacing faults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFault::Unavailable`] without a host store, or the
    /// backend's fault.
    pub fn try_remove(&self, key: &str) -> Result<(), StorageFault> {
        self.store()?.remove_item(key)
    }

    /// Read and decode a JSON value, surfacing faults.
    ///
    /// # Errors
    ///
    /// Returns any [`try_get`](Self::try_get) fault, or
    /// [`StorageFault::Deserialize`] when the stored text is not valid JSON
    /// for `T`.
    pub fn try_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageFault> {
        let Some(raw) = self.try_get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(StorageFault::Deserialize)
    }

    /// Encode `value` as JSON and write it, surfacing faults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFault::Serialize`] when encoding fails, or any
    /// [`try_set`](Self::try_set) fault.
    pub fn try_set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageFault> {
        let store = self.store()?;
        let raw = serde_json::to_string(value).map_err(StorageFault::Serialize)?;
        store.set_item(key, &raw)
    }

    // =========================================================================
    // FAULT-ABSORBING OPERATIONS
    // =========================================================================

    /// Stored string for `key`, or `default` when absent or unreadable.
    pub fn get(&self, key: &str, default: &str) -> String {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) | Err(StorageFault::Unavailable) => default.to_owned(),
            Err(e) => {
                log::warn!("storage get failed: key={key} error={e}");
                default.to_owned()
            }
        }
    }

    /// Store `value` under `key`. Returns whether the write landed.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(StorageFault::Unavailable) => false,
            Err(e) => {
                log::warn!("storage set failed: key={key} error={e}");
                false
            }
        }
    }

    /// Delete `key`. Returns whether the delete was performed.
    pub fn remove(&self, key: &str) -> bool {
        match self.try_remove(key) {
            Ok(()) => true,
            Err(StorageFault::Unavailable) => false,
            Err(e) => {
                log::warn!("storage remove failed: key={key} error={e}");
                false
            }
        }
    }

    /// Decoded JSON value for `key`, or `default` when absent, unreadable, or
    /// malformed.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get_json(key) {
            Ok(Some(value)) => value,
            Ok(None) | Err(StorageFault::Unavailable) => default,
            Err(e) => {
                log::warn!("storage get_json failed: key={key} error={e}");
                default
            }
        }
    }

    /// Encode `value` as JSON and store it. Returns whether the write landed.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set_json(key, value) {
            Ok(()) => true,
            Err(StorageFault::Unavailable) => false,
            Err(e) => {
                log::warn!("storage set_json failed: key={key} error={e}");
                false
            }
        }
    }

    /// Probe the store by writing and removing the sentinel key.
    pub fn is_available(&self) -> bool {
        let Ok(store) = self.store() else {
            return false;
        };
        let probe = self.config.probe_key.as_str();
        if store.set_item(probe, "test").is_err() {
            // A failed write can still leave a partial entry behind on some hosts.
            let _ = store.remove_item(probe);
            return false;
        }
        store.remove_item(probe).is_ok()
    }

    /// Approximate store footprint. All zeros when unavailable.
    pub fn usage(&self) -> StorageUsage {
        if !self.is_available() {
            return StorageUsage::default();
        }

        let used: u64 = self
            .all_keys()
            .iter()
            .filter_map(|key| match self.try_get(key) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("storage usage skipped entry: key={key} error={e}");
                    None
                }
            })
            .map(|value| value.len() as u64)
            .sum();
        let total = self.config.capacity_bytes;

        #[allow(clippy::cast_precision_loss)]
        let percentage = if total > 0 { used as f64 / total as f64 * 100.0 } else { 0.0 };
        StorageUsage { used, total, percentage }
    }

    /// Erase every key. Does nothing unless `confirm` is set and the store is
    /// available.
    pub fn clear_all(&self, confirm: bool) -> bool {
        if !confirm {
            log::warn!("storage clear_all refused: pass confirm=true to erase every key");
            return false;
        }
        if !self.is_available() {
            return false;
        }
        let Ok(store) = self.store() else {
            return false;
        };
        match store.clear() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("storage clear_all failed: error={e}");
                false
            }
        }
    }

    /// Every key in host iteration order. Empty when unavailable; a fault
    /// mid-scan returns the keys read so far.
    pub fn all_keys(&self) -> Vec<String> {
        if !self.is_available() {
            return Vec::new();
        }
        let Ok(store) = self.store() else {
            return Vec::new();
        };

        let len = match store.length() {
            Ok(len) => len,
            Err(e) => {
                log::warn!("storage all_keys failed: error={e}");
                return Vec::new();
            }
        };

        let mut keys = Vec::with_capacity(len as usize);
        for index in 0..len {
            match store.key(index) {
                Ok(Some(key)) => keys.push(key),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("storage all_keys stopped at index {index}: error={e}");
                    break;
                }
            }
        }
        keys
    }

    /// Whether `key` is present. `false` when unavailable or unreadable.
    pub fn has_key(&self, key: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.try_get(key) {
            Ok(value) => value.is_some(),
            Err(e) => {
                log::warn!("storage has_key failed: key={key} error={e}");
                false
            }
        }
    }

    /// Store every entry of `items`; strings are written raw, other JSON
    /// values as JSON text. Returns how many entries landed.
    ///
    /// Entries are written one by one: a failing entry is skipped and the rest
    /// still run, so a partial failure leaves some keys written.
    pub fn set_batch(&self, items: &Map<String, Value>) -> usize {
        if !self.is_available() {
            return 0;
        }

        let mut stored = 0;
        for (key, value) in items {
            let result = match value {
                Value::String(raw) => self.try_set(key, raw),
                other => self.try_set(key, &other.to_string()),
            };
            match result {
                Ok(()) => stored += 1,
                Err(e) => log::warn!("storage set_batch skipped entry: key={key} error={e}"),
            }
        }
        stored
    }

    /// Read each key independently. A fault on one key yields `None` for that
    /// key only. Empty when unavailable.
    pub fn get_batch<K: AsRef<str>>(&self, keys: &[K]) -> BatchResult {
        if !self.is_available() {
            return BatchResult::new();
        }

        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                let value = self.try_get(key).unwrap_or_else(|e| {
                    log::warn!("storage get_batch failed: key={key} error={e}");
                    None
                });
                (key.to_owned(), value)
            })
            .collect()
    }
}
