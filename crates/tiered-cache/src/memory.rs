//! In-process cache tier
//!
//! A plain map from logical key to entry, held for the process lifetime
//! only. TTL enforcement lives in the manager; this tier just stores.

use crate::types::CacheEntry;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct MemoryTier<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> MemoryTier<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    pub async fn put(&self, key: &str, entry: CacheEntry<V>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
    }

    pub async fn delete(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

impl<V: Clone> Default for MemoryTier<V> {
    fn default() -> Self {
        Self::new()
    }
}
