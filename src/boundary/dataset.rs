//! Tier 3: pre-generated static boundary datasets.
//!
//! One GeoJSON FeatureCollection per territory, generated offline and
//! shipped with the site. The resolver loads a territory's collection at
//! most once per session and remembers a failed load as "unavailable"
//! so a missing file does not cause repeat fetch attempts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::geojson;
use crate::types::{BoundaryFeature, normalize};

/// Source of per-territory boundary collections.
#[async_trait]
pub trait BoundaryDataset: Send + Sync {
    async fn load(&self, territory: &str) -> Result<Vec<BoundaryFeature>>;
}

/// Dataset directory with one `{territory}.geojson` file per territory
/// (normalized territory name).
#[derive(Debug)]
pub struct FileDataset {
    root: PathBuf,
}

impl FileDataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BoundaryDataset for FileDataset {
    async fn load(&self, territory: &str) -> Result<Vec<BoundaryFeature>> {
        let path = self.root.join(format!("{}.geojson", normalize(territory)));
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read dataset {}", path.display()))?;
        geojson::parse_feature_collection(&bytes)
    }
}

/// Find a district's feature in a loaded collection by normalized name.
/// An exact match wins; otherwise a feature whose name starts with the
/// district (e.g. "North Goa District" for "North Goa") is accepted.
pub(crate) fn find_district<'a>(
    features: &'a [BoundaryFeature],
    district: &str,
) -> Option<&'a BoundaryFeature> {
    let wanted = normalize(district);
    if wanted.is_empty() {
        return None;
    }
    features
        .iter()
        .find(|f| normalize(&f.name) == wanted)
        .or_else(|| features.iter().find(|f| normalize(&f.name).starts_with(&wanted)))
}
