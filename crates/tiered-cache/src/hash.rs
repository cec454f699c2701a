//! Logical-key hashing
//!
//! Cache keys are arbitrary caller-chosen strings; on disk they are
//! addressed by a hex SHA-256 digest, which is deterministic and
//! filesystem-safe. The mapping is never reversed: lookups recompute the
//! digest from the caller-supplied key.

use sha2::{Digest, Sha256};

/// File extension for persisted cache entries.
pub const CACHE_FILE_EXT: &str = "cache";

/// Hash a logical cache key to its fixed-length on-disk identifier.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// File name (without directory) for a logical key's persisted entry.
pub fn cache_file_name(key: &str) -> String {
    format!("{}.{}", hash_key(key), CACHE_FILE_EXT)
}
