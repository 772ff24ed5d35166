//! Keyed, TTL-expiring result caches persisted as one JSON map per domain.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::apps::InstalledApp;
use crate::common::errors::{ReclaimError, Result};
use crate::profiles::RecommendationSet;
use crate::scanner::DiskNode;

pub const CATALOG_CACHE_FILE: &str = "app-catalog-cache.json";
pub const RECOMMENDATIONS_CACHE_FILE: &str = "recommendations-cache.json";
pub const STORAGE_MAP_CACHE_FILE: &str = "storage-map-cache.json";

/// One cached payload with its creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, payload: T) -> Self {
        Self {
            key: key.into(),
            created_at: Utc::now(),
            payload,
        }
    }

    /// Stale once strictly older than `max_age`
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > max_age
    }
}

/// Mutex-guarded store backed by a single file.
///
/// The file is read once in [`CacheStore::open`]; every mutation rewrites it
/// through a temp file and a rename so an interrupted process never leaves a
/// half-written map behind. Persistence errors are logged, not returned.
pub struct CacheStore<T> {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CacheEntry<T>>>,
}

pub type CatalogCache = CacheStore<Vec<InstalledApp>>;
pub type RecommendationsCache = CacheStore<RecommendationSet>;
pub type StorageMapCache = CacheStore<DiskNode>;

impl<T> CacheStore<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Open a store, starting empty when the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("discarding cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Open the store named `file_name` inside `dir`
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::open(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, key: &str, max_age: Duration) -> Option<CacheEntry<T>> {
        self.load_at(key, max_age, Utc::now())
    }

    /// Fresh entry for `key` as of `now`; a stale entry is evicted.
    pub fn load_at(&self, key: &str, max_age: Duration, now: DateTime<Utc>) -> Option<CacheEntry<T>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match entries.get(key) {
            None => {
                tracing::debug!("cache miss for {}", key);
                return None;
            }
            Some(entry) => entry.is_expired(max_age, now),
        };

        if expired {
            tracing::debug!("cache entry {} expired", key);
            entries.remove(key);
            self.persist(&entries);
            return None;
        }

        tracing::debug!("cache hit for {}", key);
        entries.get(key).cloned()
    }

    pub fn save(&self, entry: CacheEntry<T>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(entry.key.clone(), entry);
        self.persist(&entries);
    }

    /// Drop every entry and delete the backing file
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ReclaimError::CacheIo {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &BTreeMap<String, CacheEntry<T>>) {
        if let Err(e) = write_entries(&self.path, entries) {
            tracing::warn!("failed to persist cache: {}", e);
        }
    }
}

fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, CacheEntry<T>>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(ReclaimError::CacheIo {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|source| ReclaimError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn write_entries<T: Serialize>(path: &Path, entries: &BTreeMap<String, CacheEntry<T>>) -> Result<()> {
    let io_err = |source| ReclaimError::CacheIo {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_vec(entries).map_err(|source| ReclaimError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store: CacheStore<Vec<u32>> = CacheStore::in_dir(dir.path(), "numbers.json");
        let entry = CacheEntry::new("k", vec![1, 2, 3]);
        store.save(entry.clone());

        assert_eq!(store.load("k", Duration::hours(1)), Some(entry));
        assert!(store.load("other", Duration::hours(1)).is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let dir = TempDir::new().unwrap();
        let store: CacheStore<String> = CacheStore::in_dir(dir.path(), "s.json");
        let entry = CacheEntry::new("k", "v".to_string());
        let created = entry.created_at;
        store.save(entry);

        let max_age = Duration::seconds(60);
        assert!(store.load_at("k", max_age, created + Duration::seconds(60)).is_some());
        assert!(store.load_at("k", max_age, created + Duration::seconds(61)).is_none());
        // Evicted, not just hidden
        assert!(store.load_at("k", max_age, created).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json");
        {
            let store: CacheStore<u64> = CacheStore::open(&path);
            store.save(CacheEntry::new("a", 42));
        }
        let reopened: CacheStore<u64> = CacheStore::open(&path);
        assert_eq!(reopened.load("a", Duration::days(1)).map(|e| e.payload), Some(42));
        assert!(!dir.path().join("p.json.tmp").exists());
    }

    #[test]
    fn test_concurrent_writers_keep_every_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.json");
        let store: Arc<CacheStore<u64>> = Arc::new(CacheStore::open(&path));

        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25u64 {
                        store.save(CacheEntry::new(format!("w{}-{}", worker, i), worker * 100 + i));
                        let _ = store.load(&format!("w{}-0", worker), Duration::hours(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        let reopened: CacheStore<u64> = CacheStore::open(&path);
        assert_eq!(reopened.len(), 200);
        for worker in 0..8u64 {
            for i in 0..25u64 {
                let entry = reopened.load(&format!("w{}-{}", worker, i), Duration::hours(1));
                assert_eq!(entry.map(|e| e.payload), Some(worker * 100 + i));
            }
        }
        assert!(!dir.path().join("shared.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let store: CacheStore<u64> = CacheStore::open(&path);
        assert!(store.is_empty());
        store.save(CacheEntry::new("a", 1));
        assert_eq!(CacheStore::<u64>::open(&path).len(), 1);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store: CacheStore<u64> = CacheStore::in_dir(dir.path(), "c.json");
        store.save(CacheEntry::new("a", 1));
        assert!(store.path().exists());
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.clear().is_ok());
    }
}
