//! Fixed-TTL cache buckets for the music library

use crate::types::{CacheValue, DurationBatch, Track};
use std::sync::Arc;
use tiered_cache::CacheManager;
use tracing::{debug, info, warn};

/// Key for the full library listing.
const MUSIC_LIST_KEY: &str = "all_music_list";

/// Key prefix for per-file durations.
const DURATION_KEY_PREFIX: &str = "duration:";

/// The library listing is refreshed every 2 hours.
pub const MUSIC_LIST_TTL_SECS: u64 = 7200;

/// File durations do not change; keep them for a day.
pub const DURATION_TTL_SECS: u64 = 86400;

/// Typed buckets over a shared [`CacheManager`]. Constructed once at
/// startup with the injected manager; no global state.
pub struct MusicListCache {
    cache: Arc<CacheManager<CacheValue>>,
}

impl MusicListCache {
    pub fn new(cache: Arc<CacheManager<CacheValue>>) -> Self {
        Self { cache }
    }

    fn duration_key(filename: &str) -> String {
        format!("{}{}", DURATION_KEY_PREFIX, filename)
    }

    /// Cached library listing, if any. With `force_refresh` the bucket is
    /// cleared first so this read (and any concurrent one) misses and the
    /// caller rescans.
    pub async fn get_all_music(&self, force_refresh: bool) -> Option<Vec<Track>> {
        if force_refresh {
            info!("Force refreshing music list cache");
            self.cache.clear(MUSIC_LIST_KEY).await;
        }
        match self.cache.get(MUSIC_LIST_KEY).await {
            Some(CacheValue::TrackList(tracks)) => Some(tracks),
            Some(other) => {
                warn!(key = MUSIC_LIST_KEY, ?other, "Unexpected cache value kind");
                None
            }
            None => None,
        }
    }

    pub async fn set_all_music(&self, tracks: Vec<Track>) {
        info!(count = tracks.len(), "Caching music list");
        self.cache
            .set_with_ttl(MUSIC_LIST_KEY, CacheValue::TrackList(tracks), MUSIC_LIST_TTL_SECS)
            .await;
    }

    /// Cached playback length for one file, in seconds.
    pub async fn get_duration(&self, filename: &str) -> Option<f64> {
        let key = Self::duration_key(filename);
        match self.cache.get(&key).await {
            Some(CacheValue::Duration(secs)) => Some(secs),
            Some(other) => {
                warn!(key = %key, ?other, "Unexpected cache value kind");
                None
            }
            None => None,
        }
    }

    pub async fn set_duration(&self, filename: &str, duration_secs: f64) {
        debug!(filename = %filename, duration_secs, "Caching duration");
        self.cache
            .set_with_ttl(
                &Self::duration_key(filename),
                CacheValue::Duration(duration_secs),
                DURATION_TTL_SECS,
            )
            .await;
    }

    /// Look up durations for many files at once. Each lookup is an
    /// independent `get` (either tier may serve it); the result is split
    /// into cached hits and the filenames left for the caller to probe.
    pub async fn get_duration_batch(&self, filenames: &[String]) -> DurationBatch {
        let mut batch = DurationBatch::default();
        for filename in filenames {
            match self.get_duration(filename).await {
                Some(secs) => {
                    batch.hits.insert(filename.clone(), secs);
                }
                None => batch.misses.push(filename.clone()),
            }
        }
        debug!(
            hits = batch.hits.len(),
            misses = batch.misses.len(),
            "Duration batch lookup"
        );
        batch
    }
}
