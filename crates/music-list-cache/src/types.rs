//! Cache value schema

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One track in the music library listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub filename: String,
}

/// Every value the music cache persists, tagged by kind so that an
/// unrecognized or mismatched record is rejected at deserialization
/// rather than silently misparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CacheValue {
    TrackList(Vec<Track>),
    /// Playback length in seconds.
    Duration(f64),
}

/// Result of a batch duration lookup, partitioned into cached hits and
/// the filenames the caller still has to probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationBatch {
    pub hits: HashMap<String, f64>,
    pub misses: Vec<String>,
}
