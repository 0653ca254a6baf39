//! Numbered marker placement for multi-record districts.
//!
//! A district with several offices gets one numbered pin per office so
//! the tooltip/legend can refer to them. Placement is deterministic:
//! records are processed in code order, numbers follow that order, and
//! offices sharing a locality are nudged apart by a fixed per-collision
//! offset. A batch is cancellable as a whole; a cancelled batch applies
//! nothing.

use ahash::AHashMap;
use anyhow::{Context, Result};
use async_trait::async_trait;
use geo::Coord;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::boundary::http_client;
use crate::types::{MarkerPlacement, RegionRecord, normalize};

/// Offset in degrees applied per prior marker in the same locality.
pub const COLLISION_OFFSET_DEG: f64 = 0.005;

/// Forward geocoding of a sub-location query.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the location could not be found; errors are
    /// treated the same way by the placement batch.
    async fn geocode(&self, query: &str) -> Result<Option<Coord<f64>>>;
}

/// Nominatim-style HTTP geocoder (`/search`, point results only).
/// Shares the boundary lookup's client conventions: generic UA, 10 s
/// timeout, no retries.
#[derive(Debug)]
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://nominatim.openstreetmap.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self { client: http_client()?, base_url: base_url.into() })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coord<f64>>> {
        let url = format!("{}/search", self.base_url);
        let body: Value = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?
            .json()
            .await
            .context("parse geocode response")?;

        let Some(hit) = body.as_array().and_then(|results| results.first()) else {
            return Ok(None);
        };
        let lon = hit["lon"].as_str().and_then(|s| s.parse().ok());
        let lat = hit["lat"].as_str().and_then(|s| s.parse().ok());
        match (lon, lat) {
            (Some(x), Some(y)) => Ok(Some(Coord { x, y })),
            _ => Ok(None),
        }
    }
}

/// Geocode and place one numbered marker per record of a multi-record
/// district.
///
/// Returns `None` if the batch was cancelled (the caller must apply
/// nothing), `Some(vec![])` for districts with fewer than two records
/// (the boundary click alone suffices there). Records that fail to
/// geocode are skipped; their marker numbers are still reserved so
/// numbering stays stable across re-renders.
pub async fn place_markers(
    records: &[RegionRecord],
    district: &str,
    territory: &str,
    geocoder: &dyn Geocoder,
    cancel: &CancellationToken,
) -> Option<Vec<MarkerPlacement>> {
    if records.len() < 2 {
        return Some(Vec::new());
    }

    let mut ordered: Vec<&RegionRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.code.cmp(&b.code));

    let mut collisions: AHashMap<String, u32> = AHashMap::new();
    let mut placements = Vec::with_capacity(ordered.len());

    for (index, record) in ordered.iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(district, "marker batch cancelled");
            return None;
        }

        let locality = record.locality.as_deref().unwrap_or(&record.region);
        let query = format!("{locality}, {district}, {territory}");
        let position = match geocoder.geocode(&query).await {
            Ok(Some(coord)) => coord,
            Ok(None) => {
                debug!(code = %record.code, %query, "geocode miss, skipping marker");
                continue;
            }
            Err(err) => {
                debug!(code = %record.code, %query, error = %err, "geocode failed, skipping marker");
                continue;
            }
        };
        if cancel.is_cancelled() {
            debug!(district, "marker batch cancelled");
            return None;
        }

        // Earlier placements in the same locality push later ones aside.
        let prior = collisions.entry(normalize(locality)).or_insert(0);
        let offset = COLLISION_OFFSET_DEG * f64::from(*prior);
        *prior += 1;

        placements.push(MarkerPlacement {
            record: (*record).clone(),
            number: (index + 1) as u32,
            position: Coord { x: position.x + offset, y: position.y + offset },
        });
    }

    Some(placements)
}
