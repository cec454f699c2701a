//! Two-tier cache orchestration
//!
//! Read path: memory, then disk with promotion back into memory, then
//! miss. Write path: both tiers. Liveness in both tiers is judged by the
//! TTL recorded on the entry at write time, so an entry can never look
//! live in one tier and expired in the other.

use crate::disk::PersistentTier;
use crate::error::{CacheError, Result};
use crate::memory::MemoryTier;
use crate::types::{CacheConfig, CacheEntry, CacheStats};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct CacheManager<V> {
    memory: MemoryTier<V>,
    disk: PersistentTier<V>,
    default_ttl_secs: u64,
    /// Serializes mutating operations (`set`, `clear`, `cleanup`) and the
    /// disk-fallback path of `get`, which may promote or delete. Plain
    /// memory hits only take the tier's read lock.
    write_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> CacheManager<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            memory: MemoryTier::new(),
            disk: PersistentTier::new(config.cache_dir),
            default_ttl_secs: config.default_ttl_secs,
            write_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Ensure the persistent tier's directory exists.
    pub async fn init(&self) -> Result<()> {
        self.disk.init().await?;
        info!(cache_dir = ?self.disk.dir(), "Cache initialized");
        Ok(())
    }

    /// Look up a key, memory tier first.
    ///
    /// Expired entries are removed from whichever tier held them; a disk
    /// hit is promoted into memory. I/O and deserialization failures
    /// degrade to a miss, never an error.
    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.memory.get(key).await {
            if entry.is_live(Utc::now()) {
                debug!(key = %key, "Memory cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value);
            }
        }

        // Expiry and the disk fallback mutate shared state, so they run
        // under the write lock; the memory entry is re-checked in case a
        // concurrent set replaced it while we waited. Time is re-sampled
        // under the lock too: the wait can outlive an entry's TTL.
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        if let Some(entry) = self.memory.get(key).await {
            if entry.is_live(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value);
            }
            debug!(key = %key, "Memory cache entry expired");
            self.memory.delete(key).await;
        }

        match self.disk.load(key).await {
            Ok(Some(entry)) => {
                if entry.is_live(now) {
                    debug!(key = %key, "Disk cache hit, promoting to memory");
                    self.memory.put(key, entry.clone()).await;
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value);
                }
                debug!(key = %key, "Disk cache entry expired, deleting");
                if let Err(e) = self.disk.delete(key).await {
                    warn!(key = %key, error = %e, "Failed to delete expired cache file");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache file");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Write a value through to both tiers with the configured default TTL.
    pub async fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl_secs).await;
    }

    /// Write a value through to both tiers, silently replacing any prior
    /// entry. A disk failure is logged and the write degrades to
    /// memory-only.
    pub async fn set_with_ttl(&self, key: &str, value: V, ttl_secs: u64) {
        let entry = CacheEntry::new(value, ttl_secs);

        let _guard = self.write_lock.lock().await;
        self.memory.put(key, entry.clone()).await;
        if let Err(e) = self.disk.save(key, &entry).await {
            warn!(key = %key, error = %e, "Failed to persist cache entry");
        }
    }

    /// Remove one key from both tiers.
    pub async fn clear(&self, key: &str) {
        let _guard = self.write_lock.lock().await;
        self.memory.delete(key).await;
        if let Err(e) = self.disk.delete(key).await {
            warn!(key = %key, error = %e, "Failed to delete cache file");
        }
        info!(key = %key, "Cleared cache entry");
    }

    /// Empty both tiers.
    pub async fn clear_all(&self) {
        let _guard = self.write_lock.lock().await;
        self.memory.clear().await;
        match self.disk.delete_all().await {
            Ok(removed) => info!(removed, "Cleared all cache entries"),
            Err(e) => warn!(error = %e, "Failed to clear persistent cache"),
        }
    }

    /// Sweep the persistent tier, deleting every expired or corrupt file.
    /// Returns the number of files removed. The memory tier is left
    /// alone; its entries expire lazily on the next read. Safe to call
    /// repeatedly and mutually exclusive with in-flight writes.
    pub async fn cleanup(&self) -> usize {
        let mut removed = 0;

        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let mut dir = match self.disk.list_all().await {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "Failed to list cache directory");
                return 0;
            }
        };

        loop {
            let dirent = match dir.next_entry().await {
                Ok(Some(dirent)) => dirent,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read cache directory entry");
                    break;
                }
            };
            let path = dirent.path();
            if !PersistentTier::<V>::is_cache_file(&path) {
                continue;
            }

            let expired = match self.disk.read_record(&path).await {
                Ok(Some(entry)) => !entry.is_live(now),
                // Deleted between listing and reading
                Ok(None) => continue,
                // Corrupt files go unconditionally
                Err(CacheError::Serialization(msg)) => {
                    warn!(path = ?path, error = %msg, "Corrupt cache file");
                    true
                }
                // A transient read failure is not corruption; leave the
                // file for a later sweep
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to read cache file");
                    continue;
                }
            };

            if expired {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = ?path, error = %e, "Failed to delete cache file"),
                }
            }
        }

        if removed > 0 {
            info!(removed, "Cleanup removed expired cache entries");
        }
        removed
    }

    /// Current counters and memory-tier occupancy.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.len().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
