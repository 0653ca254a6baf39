//! Approximate "center of a boundary" for panning and overlay anchors.

use geo::Coord;

use crate::types::BoundaryFeature;

/// Pan target when no geometry is available at all (country centroid,
/// lon/lat).
pub const FALLBACK_CENTER: Coord<f64> = Coord { x: 78.9629, y: 20.5937 };

/// Number of leading outer-ring coordinates averaged when no bbox is
/// present. An exact centroid is not needed for a pan target.
const RING_SAMPLE: usize = 10;

/// Approximate center of a boundary: bbox midpoint when a bbox is
/// present, otherwise the average of the first few outer-ring points,
/// otherwise [`FALLBACK_CENTER`].
pub fn boundary_center(feature: Option<&BoundaryFeature>) -> Coord<f64> {
    let Some(feature) = feature else {
        return FALLBACK_CENTER;
    };

    if let Some(bbox) = feature.bbox {
        return bbox.center();
    }

    let Some(polygon) = feature.geometry.0.first() else {
        return FALLBACK_CENTER;
    };
    let sample: Vec<Coord<f64>> = polygon.exterior().coords().copied().take(RING_SAMPLE).collect();
    if sample.is_empty() {
        return FALLBACK_CENTER;
    }
    let n = sample.len() as f64;
    Coord {
        x: sample.iter().map(|c| c.x).sum::<f64>() / n,
        y: sample.iter().map(|c| c.y).sum::<f64>() / n,
    }
}
