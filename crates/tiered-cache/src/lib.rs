//! Two-tier cache with TTL expiration
//!
//! Combines a fast in-process tier with a durable on-disk tier. Reads go
//! memory-first with promotion of disk hits; writes go through to both
//! tiers. Expired entries are dropped lazily on read and eagerly by the
//! [`CacheManager::cleanup`] sweep; corrupt disk files are deleted on sight.

pub mod disk;
pub mod error;
pub mod hash;
pub mod manager;
pub mod memory;
pub mod types;

pub use disk::PersistentTier;
pub use error::{CacheError, Result};
pub use hash::{cache_file_name, hash_key};
pub use manager::CacheManager;
pub use memory::MemoryTier;
pub use types::{CacheConfig, CacheEntry, CacheStats};
