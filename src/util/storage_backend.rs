//! Host key-value store boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SafeStorage` never touches `web_sys` directly. It talks to a
//! [`StorageBackend`], which is either the browser's `localStorage`
//! (hydrate builds) or an in-memory map used for SSR/native builds and tests.
//!
//! ERROR HANDLING
//! ==============
//! Backends report every failed call as a [`StorageFault`]. Absorbing those
//! faults is the accessor's job, not the backend's.

#[cfg(test)]
#[path = "storage_backend_test.rs"]
mod storage_backend_test;

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

// =============================================================================
// ERROR
// =============================================================================

/// Reasons a storage call can fail.
#[derive(Debug, thiserror::Error)]
pub enum StorageFault {
    /// No window/document context exists, so there is no store at all.
    #[error("storage unavailable: no window context")]
    Unavailable,

    /// The host store threw while performing `op`.
    #[error("storage {op} failed: {message}")]
    Access { op: &'static str, message: String },

    /// The write would exceed the store's capacity.
    #[error("storage quota exceeded ({used} of {limit} bytes)")]
    QuotaExceeded { used: usize, limit: usize },

    /// Access is blocked (privacy mode, security policy).
    #[error("storage access denied")]
    Denied,

    /// A value could not be encoded as JSON.
    #[error("serialize failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Stored text is not valid JSON for the requested type.
    #[error("deserialize failed: {0}")]
    Deserialize(#[source] serde_json::Error),
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Synchronous string-to-string store with the `Storage` Web API shape.
pub trait StorageBackend {
    /// Read the value for `key`, `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] when the host store throws.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageFault>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] on quota or access failures.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageFault>;

    /// Delete `key`. Removing an absent key is not a fault.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] when the host store throws.
    fn remove_item(&self, key: &str) -> Result<(), StorageFault>;

    /// Delete every key.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] when the host store throws.
    fn clear(&self) -> Result<(), StorageFault>;

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] when the host store throws.
    fn length(&self) -> Result<u32, StorageFault>;

    /// Key at `index` in host iteration order.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageFault`] when the host store throws.
    fn key(&self, index: u32) -> Result<Option<String>, StorageFault>;
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// Insertion-ordered in-memory store.
///
/// Also doubles as a fault simulator: a byte quota, a privacy-mode lock, and
/// per-key read poisoning let callers exercise every fault path without a
/// browser.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<Vec<(String, String)>>,
    quota: Option<usize>,
    locked: Cell<bool>,
    poisoned: RefCell<HashSet<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once stored value bytes would exceed `limit`.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self { quota: Some(limit), ..Self::default() }
    }

    /// Make every call fail with [`StorageFault::Denied`].
    pub fn lock(&self) {
        self.locked.set(true);
    }

    pub fn unlock(&self) {
        self.locked.set(false);
    }

    /// Make reads of `key` fail as if the entry were corrupted.
    pub fn poison(&self, key: &str) {
        self.poisoned.borrow_mut().insert(key.to_owned());
    }

    fn check_access(&self) -> Result<(), StorageFault> {
        if self.locked.get() { Err(StorageFault::Denied) } else { Ok(()) }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageFault> {
        self.check_access()?;
        if self.poisoned.borrow().contains(key) {
            return Err(StorageFault::Access { op: "get", message: format!("entry {key} is unreadable") });
        }
        Ok(self
            .entries
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageFault> {
        self.check_access()?;
        if let Some(limit) = self.quota {
            let used = self.used_bytes_without(key) + value.len();
            if used > limit {
                return Err(StorageFault::QuotaExceeded { used, limit });
            }
        }
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => entries.push((key.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageFault> {
        self.check_access()?;
        self.entries.borrow_mut().retain(|(k, _)| k != key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageFault> {
        self.check_access()?;
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn length(&self) -> Result<u32, StorageFault> {
        self.check_access()?;
        let len = self.entries.borrow().len();
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    fn key(&self, index: u32) -> Result<Option<String>, StorageFault> {
        self.check_access()?;
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(self.entries.borrow().get(index).map(|(k, _)| k.clone()))
    }
}

// =============================================================================
// BROWSER BACKEND
// =============================================================================

/// `window.localStorage` behind the [`StorageBackend`] trait.
#[cfg(feature = "hydrate")]
pub struct BrowserStorage {
    inner: web_sys::Storage,
}

#[cfg(feature = "hydrate")]
impl BrowserStorage {
    /// Resolve `window.localStorage`.
    ///
    /// Returns `None` without a window, or when the browser refuses to hand
    /// out the store (e.g. storage disabled by policy).
    pub fn from_window() -> Option<Self> {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
        Some(Self { inner })
    }
}

#[cfg(feature = "hydrate")]
fn js_fault(op: &'static str, err: &wasm_bindgen::JsValue) -> StorageFault {
    let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    StorageFault::Access { op, message }
}

#[cfg(feature = "hydrate")]
impl StorageBackend for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageFault> {
        self.inner.get_item(key).map_err(|e| js_fault("get", &e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageFault> {
        self.inner.set_item(key, value).map_err(|e| js_fault("set", &e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageFault> {
        self.inner.remove_item(key).map_err(|e| js_fault("remove", &e))
    }

    fn clear(&self) -> Result<(), StorageFault> {
        self.inner.clear().map_err(|e| js_fault("clear", &e))
    }

    fn length(&self) -> Result<u32, StorageFault> {
        self.inner.length().map_err(|e| js_fault("length", &e))
    }

    fn key(&self, index: u32) -> Result<Option<String>, StorageFault> {
        self.inner.key(index).map_err(|e| js_fault("key", &e))
    }
}
