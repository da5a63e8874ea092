//! # Tool Cache
//! Session-scoped cache of tool results.
//!
//! Values are stored serialized, the way a browser session store holds them:
//! `{ "data": T, "rawText": "...", "timestamp": <epoch ms> }` under the key
//! `"<tool>:<canonical args json>"`. Reads and writes never fail; a stored value
//! that does not deserialize is treated as absent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::tool::ToolArgs;

/// Raw key/value capability. Implementations decide the session boundary.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
}

/// Process-lifetime storage; the process is the session.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("storage rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .expect("storage rwlock poisoned")
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        self.inner
            .write()
            .expect("storage rwlock poisoned")
            .insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    pub raw_text: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    /// Strictly younger than `window` at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        now_ms.saturating_sub(self.timestamp) < window.as_millis() as i64
    }
}

/// `"<tool>:<args>"`. Args serialize with sorted keys, so equal maps give equal keys.
pub fn cache_key(tool: &str, args: &ToolArgs) -> String {
    let args = serde_json::to_string(args).unwrap_or_else(|_| "{}".to_string());
    format!("{tool}:{args}")
}

/// Typed adapter over a [`SessionStorage`].
#[derive(Clone)]
pub struct ToolCache {
    storage: Arc<dyn SessionStorage>,
}

impl ToolCache {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = self.storage.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(target: "cache", key, error = %e, "ignoring malformed cache entry");
                None
            }
        }
    }

    /// Replace the whole entry for `key`.
    pub fn set<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        match serde_json::to_string(entry) {
            Ok(s) => self.storage.set_item(key, s),
            Err(e) => tracing::warn!(target: "cache", key, error = %e, "cache entry not serializable"),
        }
    }
}
