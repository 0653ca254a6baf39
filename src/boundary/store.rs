//! Persistent tier of the boundary cache.
//!
//! Entries are `{ feature, fetched_at_ms }` JSON documents keyed by the
//! normalized cache key. Anything that fails schema validation on read
//! is deleted, never surfaced. Writes are atomic replaces (tempfile then
//! rename), so concurrent map instances can share one store without
//! locking.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use ahash::AHashMap;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::geojson;
use crate::types::BoundaryFeature;

/// One persistent cache entry: a boundary plus the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBoundary {
    pub feature: BoundaryFeature,
    /// Fetch time, milliseconds since the Unix epoch.
    pub fetched_at_ms: u64,
}

impl CachedBoundary {
    pub fn new(feature: BoundaryFeature, fetched_at_ms: u64) -> Self {
        Self { feature, fetched_at_ms }
    }

    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.fetched_at_ms) > ttl.as_millis() as u64
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({
            "feature": geojson::feature_to_json(&self.feature),
            "fetched_at_ms": self.fetched_at_ms,
        })
    }

    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        let fetched_at_ms = value["fetched_at_ms"].as_u64()?;
        let feature = geojson::parse_feature(&value["feature"])?;
        Some(Self { feature, fetched_at_ms })
    }
}

/// Storage backend for the persistent tier.
#[async_trait]
pub trait BoundaryStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedBoundary>>;
    async fn put(&self, key: &str, entry: &CachedBoundary) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    /// Remove every entry whose key starts with `prefix`.
    async fn clear_prefix(&self, prefix: &str) -> Result<()>;
}

/// File-backed store: one JSON document per key under a root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create cache dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Write-then-rename so readers never observe a partial document.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = NamedTempFile::new_in(&self.root).context("create temp file")?;
        std::fs::write(tmp.path(), bytes)
            .with_context(|| format!("write {}", tmp.path().display()))?;
        tmp.persist(path)
            .with_context(|| format!("rename to {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl BoundaryStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<CachedBoundary>> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };

        let entry = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .as_ref()
            .and_then(CachedBoundary::from_json);
        match entry {
            Some(entry) => Ok(Some(entry)),
            None => {
                // Malformed cache entry: delete rather than surface.
                debug!(key, "deleting malformed cache entry");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, entry: &CachedBoundary) -> Result<()> {
        let bytes = serde_json::to_vec(&entry.to_json()).context("serialize cache entry")?;
        self.write_atomic(&self.path_for(key), &bytes)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove cache entry {key}")),
        }
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<()> {
        for dirent in std::fs::read_dir(&self.root)
            .with_context(|| format!("read cache dir {}", self.root.display()))?
        {
            let path = dirent?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"));
            if matches {
                let _ = std::fs::remove_file(&path);
            }
        }
        Ok(())
    }
}

/// In-memory store: session-only persistence, also the test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<AHashMap<String, CachedBoundary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BoundaryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CachedBoundary>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: &CachedBoundary) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    use super::*;

    fn feature(name: &str) -> BoundaryFeature {
        let ring = LineString(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 0.0 },
        ]);
        BoundaryFeature {
            name: name.to_string(),
            geometry: MultiPolygon(vec![Polygon::new(ring, vec![])]),
            bbox: None,
        }
    }

    #[test]
    fn expiry_is_relative_to_fetch_time() {
        let entry = CachedBoundary::new(feature("x"), 1_000);
        let ttl = Duration::from_millis(500);
        assert!(!entry.is_expired(1_400, ttl));
        assert!(!entry.is_expired(1_500, ttl));
        assert!(entry.is_expired(1_501, ttl));
        // clock running backwards must not underflow
        assert!(!entry.is_expired(0, ttl));
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let entry = CachedBoundary::new(feature("North Goa"), 42);

        store.put("boundary_goa_north_goa", &entry).await.unwrap();
        let loaded = store.get("boundary_goa_north_goa").await.unwrap();
        assert_eq!(loaded, Some(entry));
        assert_eq!(store.get("boundary_goa_other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_deletes_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let path = dir.path().join("boundary_goa_bad.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert_eq!(store.get("boundary_goa_bad").await.unwrap(), None);
        assert!(!path.exists());

        // schema-valid JSON with the wrong shape is also deleted
        std::fs::write(&path, br#"{"fetched_at_ms": "soon"}"#).unwrap();
        assert_eq!(store.get("boundary_goa_bad").await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clear_prefix_spares_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let entry = CachedBoundary::new(feature("x"), 1);

        store.put("boundary_goa_a", &entry).await.unwrap();
        store.put("boundary_goa_b", &entry).await.unwrap();
        store.put("other_goa_a", &entry).await.unwrap();

        store.clear_prefix("boundary_").await.unwrap();
        assert_eq!(store.get("boundary_goa_a").await.unwrap(), None);
        assert_eq!(store.get("boundary_goa_b").await.unwrap(), None);
        assert!(store.get("other_goa_a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        let entry = CachedBoundary::new(feature("x"), 7);

        store.put("boundary_k", &entry).await.unwrap();
        assert_eq!(store.get("boundary_k").await.unwrap(), Some(entry));
        store.remove("boundary_k").await.unwrap();
        assert!(store.is_empty());
    }
}
