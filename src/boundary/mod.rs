//! Tiered boundary resolution.
//!
//! Lookup order for a `(territory, district)` key:
//!   1. in-memory cache (authoritative for the session)
//!   2. persistent store, TTL-validated (expired entries are purged)
//!   3. static per-territory dataset, memoized once per session
//!   4. optional remote lookup, at most once per district per session
//!
//! Every tier fails over silently; `resolve` never surfaces an error.
//! Success at tier 3 or 4 is written back to tiers 1 and 2. Concurrent
//! resolutions of one key share a single in-flight computation.

mod center;
mod dataset;
mod remote;
mod store;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::types::{BoundaryFeature, DistrictKey, normalize};

pub use center::{FALLBACK_CENTER, boundary_center};
pub use dataset::{BoundaryDataset, FileDataset};
pub use remote::{HttpLookup, RemoteLookup};
pub use store::{BoundaryStore, CachedBoundary, FileStore, MemoryStore};

pub(crate) use remote::http_client;

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Cache entry time-to-live (memory and persistent tiers).
    pub ttl: Duration,
    /// Prefix of persistent cache keys; `clear_all` removes this prefix.
    pub key_prefix: String,
    /// Whether tier 4 (remote lookup) is consulted at all.
    pub use_remote: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            key_prefix: "boundary_".to_string(),
            use_remote: true,
        }
    }
}

/// Cache-aside resolver over the four boundary tiers.
///
/// All session caches (memory tier, dataset memo, remote-attempt set,
/// in-flight map) live on this instance; dropping it or calling
/// [`clear_all`](Self::clear_all) is the only way they go away.
pub struct BoundaryResolver {
    config: ResolverConfig,
    store: Arc<dyn BoundaryStore>,
    dataset: Arc<dyn BoundaryDataset>,
    remote: Option<Arc<dyn RemoteLookup>>,

    memory: Mutex<AHashMap<DistrictKey, CachedBoundary>>,
    /// Loaded dataset per normalized territory; `None` = load failed,
    /// remembered so a missing dataset is not re-fetched this session.
    datasets: tokio::sync::Mutex<AHashMap<String, Option<Arc<Vec<BoundaryFeature>>>>>,
    /// Districts the remote service has been asked about this session.
    attempted_remote: Mutex<AHashSet<DistrictKey>>,
    /// Per-key in-flight computation, for request coalescing.
    inflight: Mutex<AHashMap<DistrictKey, Arc<OnceCell<Option<BoundaryFeature>>>>>,
}

impl BoundaryResolver {
    pub fn new(
        config: ResolverConfig,
        store: Arc<dyn BoundaryStore>,
        dataset: Arc<dyn BoundaryDataset>,
        remote: Option<Arc<dyn RemoteLookup>>,
    ) -> Self {
        Self {
            config,
            store,
            dataset,
            remote,
            memory: Mutex::new(AHashMap::new()),
            datasets: tokio::sync::Mutex::new(AHashMap::new()),
            attempted_remote: Mutex::new(AHashSet::new()),
            inflight: Mutex::new(AHashMap::new()),
        }
    }

    /// Resolve a district's boundary, or `None` if no tier has one.
    ///
    /// Cancellation (identity changed, component gone) abandons the
    /// lookup; a coalesced computation may still complete for other
    /// waiters, but this caller gets `None` and applies nothing.
    pub async fn resolve(
        &self,
        key: &DistrictKey,
        cancel: &CancellationToken,
    ) -> Option<BoundaryFeature> {
        if cancel.is_cancelled() {
            return None;
        }

        if let Some(feature) = self.memory_get(key) {
            trace!(key = key.cache_id(), "memory hit");
            return Some(feature);
        }

        let cell = {
            let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                trace!(key = key.cache_id(), "resolution cancelled");
                return None;
            }
            value = cell.get_or_init(|| self.resolve_uncached(key)) => value.clone(),
        };

        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight.remove(key);
        result
    }

    /// Tiers 2–4, run once per coalesced group of callers.
    async fn resolve_uncached(&self, key: &DistrictKey) -> Option<BoundaryFeature> {
        let storage_key = key.storage_key(&self.config.key_prefix);

        // Tier 2: persistent store, TTL-validated.
        match self.store.get(&storage_key).await {
            Ok(Some(entry)) => {
                if entry.is_expired(now_ms(), self.config.ttl) {
                    debug!(key = key.cache_id(), "persistent entry expired, purging");
                    if let Err(err) = self.store.remove(&storage_key).await {
                        debug!(key = key.cache_id(), error = %err, "purge failed");
                    }
                } else {
                    debug!(key = key.cache_id(), "persistent hit");
                    self.memory_put(key, entry.clone());
                    return Some(entry.feature);
                }
            }
            Ok(None) => {}
            Err(err) => debug!(key = key.cache_id(), error = %err, "persistent tier read failed"),
        }

        // Tier 3: static dataset.
        if let Some(features) = self.territory_features(key.territory()).await {
            if let Some(found) = dataset::find_district(&features, key.district()) {
                debug!(key = key.cache_id(), "dataset hit");
                return Some(self.write_back(key, &storage_key, found.clone()).await);
            }
        }

        // Tier 4: remote lookup, at most once per district per session.
        if self.config.use_remote {
            if let Some(lookup) = &self.remote {
                if self.mark_remote_attempt(key) {
                    match lookup.lookup(key.district(), key.territory()).await {
                        Ok(Some(feature)) => {
                            debug!(key = key.cache_id(), "remote hit");
                            return Some(self.write_back(key, &storage_key, feature).await);
                        }
                        Ok(None) => debug!(key = key.cache_id(), "remote miss"),
                        Err(err) => {
                            debug!(key = key.cache_id(), error = %err, "remote lookup failed")
                        }
                    }
                }
            }
        }

        None
    }

    /// Load (or recall) the static dataset for a territory. A failed
    /// load is remembered as unavailable for the rest of the session.
    async fn territory_features(&self, territory: &str) -> Option<Arc<Vec<BoundaryFeature>>> {
        let territory_key = normalize(territory);
        let mut datasets = self.datasets.lock().await;
        if let Some(memo) = datasets.get(&territory_key) {
            return memo.clone();
        }

        let loaded = match self.dataset.load(territory).await {
            Ok(features) => Some(Arc::new(features)),
            Err(err) => {
                debug!(territory, error = %err, "static dataset unavailable");
                None
            }
        };
        datasets.insert(territory_key, loaded.clone());
        loaded
    }

    /// Record a remote attempt; true if this is the first for the key.
    fn mark_remote_attempt(&self, key: &DistrictKey) -> bool {
        let mut attempted = self.attempted_remote.lock().unwrap_or_else(|e| e.into_inner());
        attempted.insert(key.clone())
    }

    /// Write a freshly resolved boundary to memory and persistent tiers.
    async fn write_back(
        &self,
        key: &DistrictKey,
        storage_key: &str,
        feature: BoundaryFeature,
    ) -> BoundaryFeature {
        let entry = CachedBoundary::new(feature, now_ms());
        self.memory_put(key, entry.clone());
        if let Err(err) = self.store.put(storage_key, &entry).await {
            debug!(key = key.cache_id(), error = %err, "persistent write failed");
        }
        entry.feature
    }

    fn memory_get(&self, key: &DistrictKey) -> Option<BoundaryFeature> {
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        match memory.get(key) {
            Some(entry) if entry.is_expired(now_ms(), self.config.ttl) => {
                memory.remove(key);
                None
            }
            Some(entry) => Some(entry.feature.clone()),
            None => None,
        }
    }

    fn memory_put(&self, key: &DistrictKey, entry: CachedBoundary) {
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        memory.insert(key.clone(), entry);
    }

    /// Wipe every cache this resolver owns: memory tier, dataset memo,
    /// remote-attempt set, in-flight map, and all persistent entries
    /// under the configured key prefix.
    pub async fn clear_all(&self) {
        self.memory.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.attempted_remote.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.inflight.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.datasets.lock().await.clear();
        if let Err(err) = self.store.clear_prefix(&self.config.key_prefix).await {
            debug!(error = %err, "persistent clear failed");
        }
    }
}
