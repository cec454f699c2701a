//! Music library cache buckets
//!
//! A typed façade over the two-tier cache for the media backend: the full
//! track listing (refreshed every 2 hours) and per-file playback
//! durations (kept for a day). Values are stored as a tagged
//! [`CacheValue`] so an on-disk record with an unknown tag fails
//! deserialization instead of being misparsed.

mod cache;
mod types;

pub use cache::{MusicListCache, DURATION_TTL_SECS, MUSIC_LIST_TTL_SECS};
pub use types::{CacheValue, DurationBatch, Track};
