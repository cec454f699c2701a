//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single cached value with its expiry bookkeeping.
///
/// The TTL is fixed when the entry is written; liveness checks in both
/// tiers use this recorded TTL, never one supplied at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl<V> CacheEntry<V> {
    /// Build an entry stamped with the current time.
    pub fn new(value: V, ttl_secs: u64) -> Self {
        Self {
            value,
            created_at: Utc::now(),
            ttl_secs,
        }
    }

    /// Whether the entry is still valid at `now`.
    ///
    /// This is the single liveness predicate shared by lazy reads and the
    /// eager cleanup sweep. A negative age (clock skew) counts as live;
    /// `ttl_secs == 0` is expired immediately.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() < self.ttl_secs as i64
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Configuration for a [`crate::CacheManager`], supplied at construction.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the persistent tier's entry files. Created on
    /// `init` if absent.
    pub cache_dir: PathBuf,
    /// TTL applied by `set` when the caller does not pass one.
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            default_ttl_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_entry_is_live() {
        let entry = CacheEntry::new(42u32, 60);
        assert!(entry.is_live(Utc::now()));
    }

    #[test]
    fn test_entry_past_ttl_is_expired() {
        let entry = CacheEntry {
            value: 42u32,
            created_at: Utc::now() - Duration::seconds(61),
            ttl_secs: 60,
        };
        assert!(!entry.is_live(Utc::now()));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new("x".to_string(), 0);
        assert!(!entry.is_live(Utc::now()));
    }

    #[test]
    fn test_future_created_at_is_live() {
        // Clock skew between writers must not expire an entry early.
        let entry = CacheEntry {
            value: 1.5f64,
            created_at: Utc::now() + Duration::seconds(30),
            ttl_secs: 10,
        };
        assert!(entry.is_live(Utc::now()));
    }

    #[test]
    fn test_entry_serialization_round_trip() {
        let entry = CacheEntry::new(vec!["a.mp3".to_string(), "b.mp3".to_string()], 7200);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("ttl_secs"));

        let back: CacheEntry<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, entry.value);
        assert_eq!(back.ttl_secs, 7200);
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.default_ttl_secs, 3600);
    }
}
