//! Persistent cache tier
//!
//! One JSON file per logical key under the cache directory, named by the
//! hashed key with a `.cache` extension. Writes go through a temporary
//! file and an atomic rename so readers never observe a torn entry.
//! Corrupt or unreadable files are deleted on sight and reported as
//! absent (self-healing).

use crate::error::{CacheError, Result};
use crate::hash::{cache_file_name, CACHE_FILE_EXT};
use crate::types::CacheEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// On-disk format tag. Bump when the record layout changes; records with
/// any other version are treated as corrupt and deleted.
pub const FORMAT_VERSION: u32 = 1;

/// The serialized shape of one entry file.
#[derive(Deserialize)]
struct StoredRecord<V> {
    version: u32,
    #[serde(flatten)]
    entry: CacheEntry<V>,
}

/// Borrowed counterpart of [`StoredRecord`] for writing.
#[derive(Serialize)]
struct StoredRecordRef<'a, V> {
    version: u32,
    #[serde(flatten)]
    entry: &'a CacheEntry<V>,
}

pub struct PersistentTier<V> {
    cache_dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> PersistentTier<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            _value: PhantomData,
        }
    }

    /// Ensure the cache directory exists.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the entry file for a logical key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(cache_file_name(key))
    }

    /// Read and deserialize the entry for `key`. A missing file is
    /// `Ok(None)`; a corrupt or version-mismatched file is deleted and
    /// also reported `Ok(None)`.
    pub async fn load(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        let path = self.entry_path(key);
        match self.read_record(&path).await {
            Ok(Some(entry)) => Ok(Some(entry)),
            Ok(None) => Ok(None),
            Err(CacheError::Serialization(msg)) => {
                warn!(key = %key, path = ?path, error = %msg, "Corrupt cache file, deleting");
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = ?path, error = %e, "Failed to delete corrupt cache file");
                }
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Deserialize a single entry file by path, without self-healing.
    /// Used by the cleanup sweep, which handles deletion itself.
    pub async fn read_record(&self, path: &Path) -> Result<Option<CacheEntry<V>>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: StoredRecord<V> = serde_json::from_slice(&bytes)?;
        if record.version != FORMAT_VERSION {
            return Err(CacheError::Serialization(format!(
                "unknown cache format version {}",
                record.version
            )));
        }
        Ok(Some(record.entry))
    }

    /// Serialize and persist an entry, overwriting any prior file for the
    /// same key. The write lands in a `.tmp` sibling first and is renamed
    /// into place so concurrent readers never see a partial file.
    pub async fn save(&self, key: &str, entry: &CacheEntry<V>) -> Result<()> {
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("tmp");

        let record = StoredRecordRef {
            version: FORMAT_VERSION,
            entry,
        };
        let bytes = serde_json::to_vec(&record)?;

        fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(key = %key, bytes = bytes.len(), "Persisted cache entry");
        Ok(())
    }

    /// Remove the entry file for `key`. Absence is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every cache file in the directory. Returns the number of
    /// files removed.
    pub async fn delete_all(&self) -> Result<usize> {
        let mut dir = self.list_all().await?;
        let mut removed = 0;
        while let Some(dirent) = dir.next_entry().await? {
            let path = dirent.path();
            if !Self::is_cache_file(&path) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = ?path, error = %e, "Failed to delete cache file"),
            }
        }
        Ok(removed)
    }

    /// Lazy walk of the directory's current contents, for the cleanup
    /// sweep. Finite and non-restartable; filter with
    /// [`PersistentTier::is_cache_file`].
    pub async fn list_all(&self) -> Result<fs::ReadDir> {
        Ok(fs::read_dir(&self.cache_dir).await?)
    }

    /// Whether a directory entry is one of ours (`.tmp` leftovers and
    /// foreign files are skipped by sweeps).
    pub fn is_cache_file(path: &Path) -> bool {
        path.extension().map(|ext| ext == CACHE_FILE_EXT).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tier_in(dir: &Path) -> PersistentTier<Vec<String>> {
        PersistentTier::new(dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        let entry = CacheEntry::new(vec!["a.mp3".to_string()], 7200);
        tier.save("all_music_list", &entry).await.unwrap();

        let loaded = tier.load("all_music_list").await.unwrap().unwrap();
        assert_eq!(loaded.value, vec!["a.mp3".to_string()]);
        assert_eq!(loaded.ttl_secs, 7200);
        assert_eq!(loaded.created_at, entry.created_at);
    }

    #[tokio::test]
    async fn test_load_missing_key_is_absent() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        assert!(tier.load("never_written").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_entry() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        tier.save("k", &CacheEntry::new(vec!["old".to_string()], 60))
            .await
            .unwrap();
        tier.save("k", &CacheEntry::new(vec!["new".to_string()], 120))
            .await
            .unwrap();

        let loaded = tier.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.value, vec!["new".to_string()]);
        assert_eq!(loaded.ttl_secs, 120);
    }

    #[tokio::test]
    async fn test_save_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        tier.save("k", &CacheEntry::new(vec![], 60)).await.unwrap();

        let mut names = Vec::new();
        let mut rd = fs::read_dir(dir.path()).await.unwrap();
        while let Some(dirent) = rd.next_entry().await.unwrap() {
            names.push(dirent.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".cache"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_deleted_on_load() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        let path = tier.entry_path("k");
        fs::write(&path, b"{ this is not json").await.unwrap();

        assert!(tier.load("k").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_truncated_file_is_deleted_on_load() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        tier.save("k", &CacheEntry::new(vec!["x".to_string()], 60))
            .await
            .unwrap();
        let path = tier.entry_path("k");
        let bytes = fs::read(&path).await.unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).await.unwrap();

        assert!(tier.load("k").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unknown_version_is_treated_as_corrupt() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        let path = tier.entry_path("k");
        fs::write(
            &path,
            br#"{"version":99,"value":[],"created_at":"2026-01-01T00:00:00Z","ttl_secs":60}"#,
        )
        .await
        .unwrap();

        assert!(tier.load("k").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        tier.save("k", &CacheEntry::new(vec![], 60)).await.unwrap();
        tier.delete("k").await.unwrap();
        assert!(tier.load("k").await.unwrap().is_none());

        // Absent file is not an error
        tier.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_removes_only_cache_files() {
        let dir = tempdir().unwrap();
        let tier = tier_in(dir.path());
        tier.init().await.unwrap();

        tier.save("a", &CacheEntry::new(vec![], 60)).await.unwrap();
        tier.save("b", &CacheEntry::new(vec![], 60)).await.unwrap();
        fs::write(dir.path().join("README.txt"), b"not a cache file")
            .await
            .unwrap();

        let removed = tier.delete_all().await.unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("README.txt").exists());
    }
}
