use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::helpers::time::now_i64;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: i64, // UNIX timestamp
}

/// Shared key-value store with per-key expiry, backing the cache-aside
/// strategy of every fetcher.
///
/// Expiry is lazy: an entry past its deadline is filtered on read, never
/// swept. Per-key get/set is atomic, last write wins; there is no
/// cross-key atomicity. Constructed once at startup and cloned into each
/// consumer (cheap — the map is behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Get the value if it exists and is not expired
    pub async fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().await;
        map.get(key)
            .filter(|entry| now_i64() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Insert the value under the key; overwrites and resets the TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) {
        let entry = Entry { value: value.to_owned(), expires_at: now_i64() + ttl_seconds as i64 };
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), entry);
    }
}
