use geo::{Coord, MultiPolygon, Rect};

use super::record::RegionRecord;

/// A district outline with metadata.
///
/// Only polygonal geometry is representable; anything else in the source
/// data is treated as absent at parse time. A GeoJSON `Polygon` is
/// promoted to a single-polygon `MultiPolygon`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub bbox: Option<Rect<f64>>,
}

/// A numbered pin for one office of a multi-record district.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPlacement {
    pub record: RegionRecord,
    /// 1-based marker number, stable for a given record set.
    pub number: u32,
    /// Geocoded position (lon, lat), collision offset already applied.
    pub position: Coord<f64>,
}
