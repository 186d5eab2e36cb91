//! Expiring JSON cache stored through [`SafeStorage`].
//!
//! DESIGN
//! ======
//! Every value is wrapped in a [`CacheEntry`] envelope carrying its expiry so
//! stale identity/credits data can be dropped on read or swept in bulk. Keys
//! are namespaced with the configured cache prefix; `clean_expired` only ever
//! touches keys under that prefix.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::storage::SafeStorage;
use super::storage_backend::{StorageBackend, StorageFault};

/// Stored envelope around a cached value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    /// Milliseconds since the Unix epoch when the entry was written.
    pub stored_at_ms: i64,
    /// Milliseconds since the Unix epoch after which the entry is stale.
    pub expires_at_ms: i64,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Expiry-only view of an envelope, used when sweeping without knowing `T`.
#[derive(Deserialize)]
struct EntryHeader {
    expires_at_ms: i64,
}

/// Expiring cache over a borrowed [`SafeStorage`].
pub struct CacheStore<'a, B: StorageBackend> {
    storage: &'a SafeStorage<B>,
}

impl<'a, B: StorageBackend> CacheStore<'a, B> {
    pub fn new(storage: &'a SafeStorage<B>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &'a SafeStorage<B> {
        self.storage
    }

    /// Full storage key for cache slot `name`.
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.storage.config().cache_prefix)
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.storage.config().cache_ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    /// Cached value for `name`, if present, decodable, and fresh.
    ///
    /// Expired or malformed entries are removed.
    pub fn load<T: DeserializeOwned>(&self, name: &str, now_ms: i64) -> Option<T> {
        let key = self.key(name);
        match self.storage.try_get_json::<CacheEntry<T>>(&key) {
            Ok(Some(entry)) if !entry.is_expired(now_ms) => Some(entry.value),
            Ok(Some(_)) => {
                self.storage.remove(&key);
                None
            }
            Ok(None) | Err(StorageFault::Unavailable) => None,
            Err(StorageFault::Deserialize(e)) => {
                log::warn!("cache entry malformed, dropping: key={key} error={e}");
                self.storage.remove(&key);
                None
            }
            Err(e) => {
                log::warn!("cache load failed: key={key} error={e}");
                None
            }
        }
    }

    /// Cache `value` under `name` for the configured TTL.
    pub fn store<T: Serialize>(&self, name: &str, value: &T, now_ms: i64) -> bool {
        let entry =
            CacheEntry { value, stored_at_ms: now_ms, expires_at_ms: now_ms.saturating_add(self.ttl_ms()) };
        self.storage.set_json(&self.key(name), &entry)
    }

    /// Drop the cached value for `name`.
    pub fn invalidate(&self, name: &str) -> bool {
        self.storage.remove(&self.key(name))
    }

    /// Remove every expired or malformed entry under the cache prefix.
    ///
    /// Returns the number of entries removed.
    pub fn clean_expired(&self, now_ms: i64) -> usize {
        let prefix = self.storage.config().cache_prefix.as_str();
        let stale: Vec<String> = self
            .storage
            .all_keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| match self.storage.try_get_json::<EntryHeader>(key) {
                Ok(Some(header)) => now_ms >= header.expires_at_ms,
                Ok(None) => false,
                Err(StorageFault::Deserialize(_)) => true,
                Err(e) => {
                    log::warn!("cache sweep skipped entry: key={key} error={e}");
                    false
                }
            })
            .collect();

        stale.iter().filter(|key| self.storage.remove(key)).count()
    }
}

/// Current time in milliseconds since the Unix epoch.
#[cfg(feature = "hydrate")]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Current time in milliseconds since the Unix epoch.
#[cfg(not(feature = "hydrate"))]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
