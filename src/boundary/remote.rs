//! Tier 4: best-effort external boundary lookup.
//!
//! The upstream service is slow and rate-sensitive, so the contract is
//! deliberately timid: one query plus one alternate variant, a 10 s
//! timeout, no retries, and a generic user agent. Any failure or empty
//! result is a miss, not an error the caller has to handle. The resolver
//! guarantees at most one attempt per district per session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use geo::{Coord, Rect};
use serde_json::Value;
use tracing::debug;

use crate::geojson;
use crate::types::BoundaryFeature;

/// Generic client identity; a product-specific UA gets rate-limited harder.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; atlas-map)";

const TIMEOUT_SECS: u64 = 10;

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
        .build()
        .context("build http client")
}

/// External boundary search.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Look up a district's boundary. `Ok(None)` is a miss; errors are
    /// treated as misses by the resolver.
    async fn lookup(&self, district: &str, territory: &str) -> Result<Option<BoundaryFeature>>;
}

/// Nominatim-style HTTP lookup (`/search` with `polygon_geojson=1`).
#[derive(Debug)]
pub struct HttpLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLookup {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://nominatim.openstreetmap.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self { client: http_client()?, base_url: base_url.into() })
    }

    async fn search(&self, query: &str) -> Result<Option<BoundaryFeature>> {
        let url = format!("{}/search", self.base_url);
        let body: Value = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ])
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?
            .json()
            .await
            .context("parse lookup response")?;

        let Some(hit) = body.as_array().and_then(|results| results.first()) else {
            return Ok(None);
        };
        Ok(parse_search_hit(hit))
    }
}

#[async_trait]
impl RemoteLookup for HttpLookup {
    async fn lookup(&self, district: &str, territory: &str) -> Result<Option<BoundaryFeature>> {
        // One alternate variant, nothing more: the qualified form first
        // (disambiguates towns that share the district's name), then plain.
        let variants = [
            format!("{district} district, {territory}"),
            format!("{district}, {territory}"),
        ];
        for query in &variants {
            match self.search(query).await {
                Ok(Some(feature)) => return Ok(Some(feature)),
                Ok(None) => debug!(%query, "remote lookup: no polygonal result"),
                Err(err) => debug!(%query, error = %err, "remote lookup failed"),
            }
        }
        Ok(None)
    }
}

/// Extract a boundary from one search result. Non-polygonal geometry
/// (the service often returns a point for small places) is a miss.
fn parse_search_hit(hit: &Value) -> Option<BoundaryFeature> {
    let geometry = geojson::parse_geometry(&hit["geojson"])?;
    let name = hit["display_name"].as_str().unwrap_or_default().to_string();
    Some(BoundaryFeature { name, geometry, bbox: parse_boundingbox(&hit["boundingbox"]) })
}

/// `boundingbox` comes back as `[min_lat, max_lat, min_lon, max_lon]`
/// strings; note the lat-first order.
fn parse_boundingbox(value: &Value) -> Option<Rect<f64>> {
    let parts = value.as_array()?;
    if parts.len() < 4 {
        return None;
    }
    let mut nums = [0.0f64; 4];
    for (slot, part) in nums.iter_mut().zip(parts) {
        *slot = match part {
            Value::String(s) => s.parse().ok()?,
            other => other.as_f64()?,
        };
    }
    let [min_lat, max_lat, min_lon, max_lon] = nums;
    Some(Rect::new(
        Coord { x: min_lon, y: min_lat },
        Coord { x: max_lon, y: max_lat },
    ))
}
