//! GeoJSON parsing for boundary features.
//!
//! Tolerant by design: a feature collection may mix geometry kinds, and
//! anything that is not a Polygon or MultiPolygon is skipped rather than
//! rejected. Cached entries round-trip through the same JSON shape.

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon, Rect};
use serde_json::{Value, json};

use crate::types::BoundaryFeature;

/// Parse a GeoJSON FeatureCollection into boundary features.
/// Features without a usable polygonal geometry are skipped.
pub(crate) fn parse_feature_collection(bytes: &[u8]) -> Result<Vec<BoundaryFeature>> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    let mut features = Vec::new();

    if let Some(list) = value["features"].as_array() {
        for feature in list {
            if let Some(parsed) = parse_feature(feature) {
                features.push(parsed);
            }
        }
    }
    Ok(features)
}

/// Parse a single GeoJSON Feature. Returns `None` for non-polygonal or
/// malformed geometry (the invariant: geometry.type is Polygon or
/// MultiPolygon, anything else is absent).
pub(crate) fn parse_feature(value: &Value) -> Option<BoundaryFeature> {
    let geometry = parse_geometry(&value["geometry"])?;

    let name = value["properties"]["name"]
        .as_str()
        .or_else(|| value["properties"]["district"].as_str())
        .or_else(|| value["name"].as_str())
        .unwrap_or_default()
        .to_string();

    let bbox = parse_bbox(&value["bbox"]);

    Some(BoundaryFeature { name, geometry, bbox })
}

/// Parse a GeoJSON geometry object, promoting Polygon to MultiPolygon.
pub(crate) fn parse_geometry(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coords = geometry["coordinates"].as_array()?;
    match geometry["type"].as_str() {
        Some("Polygon") => parse_polygon_coords(coords).map(|p| MultiPolygon(vec![p])),
        Some("MultiPolygon") => {
            let polygons: Vec<Polygon<f64>> = coords
                .iter()
                .filter_map(|c| c.as_array().and_then(|a| parse_polygon_coords(a)))
                .collect();
            if polygons.is_empty() { None } else { Some(MultiPolygon(polygons)) }
        }
        _ => None,
    }
}

/// GeoJSON `bbox`: `[min_lon, min_lat, max_lon, max_lat]`.
fn parse_bbox(value: &Value) -> Option<Rect<f64>> {
    let parts = value.as_array()?;
    if parts.len() < 4 {
        return None;
    }
    let nums: Vec<f64> = parts.iter().filter_map(|v| v.as_f64()).collect();
    if nums.len() < 4 {
        return None;
    }
    Some(Rect::new(
        Coord { x: nums[0], y: nums[1] },
        Coord { x: nums[2], y: nums[3] },
    ))
}

/// Polygon coordinates: `[exterior_ring, interior_ring, ...]`.
fn parse_polygon_coords(rings: &[Value]) -> Option<Polygon<f64>> {
    let exterior = parse_ring_coords(rings.first()?.as_array()?)?;
    let interiors: Vec<LineString<f64>> = rings
        .iter()
        .skip(1)
        .filter_map(|r| r.as_array().and_then(|a| parse_ring_coords(a)))
        .collect();
    Some(Polygon::new(exterior, interiors))
}

/// A ring: `[[x, y], [x, y], ...]`. Closed on parse if the source left it open.
fn parse_ring_coords(coords: &[Value]) -> Option<LineString<f64>> {
    let mut points = Vec::new();

    for pair in coords {
        if let Some(parts) = pair.as_array() {
            if parts.len() >= 2 {
                let x = parts[0].as_f64()?;
                let y = parts[1].as_f64()?;
                points.push(Coord { x, y });
            }
        }
    }
    if points.is_empty() {
        return None;
    }
    if points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Some(LineString(points))
}

/// Serialize a boundary feature to the JSON shape used by the persistent
/// tier (a GeoJSON Feature with MultiPolygon geometry).
pub(crate) fn feature_to_json(feature: &BoundaryFeature) -> Value {
    let polygons: Vec<Value> = feature
        .geometry
        .0
        .iter()
        .map(|polygon| {
            let mut rings = vec![ring_to_json(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_to_json));
            json!(rings)
        })
        .collect();

    let mut out = json!({
        "type": "Feature",
        "properties": { "name": feature.name },
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": polygons,
        },
    });
    if let Some(bbox) = feature.bbox {
        out["bbox"] = json!([bbox.min().x, bbox.min().y, bbox.max().x, bbox.max().y]);
    }
    out
}

fn ring_to_json(ring: &LineString<f64>) -> Value {
    json!(ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_polygon_json(name: &str) -> Value {
        json!({
            "type": "Feature",
            "properties": { "name": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]],
            },
        })
    }

    #[test]
    fn parses_polygon_as_single_multipolygon() {
        let feature = parse_feature(&square_polygon_json("North Goa")).unwrap();
        assert_eq!(feature.name, "North Goa");
        assert_eq!(feature.geometry.0.len(), 1);
        assert_eq!(feature.geometry.0[0].exterior().coords().count(), 5);
        assert!(feature.bbox.is_none());
    }

    #[test]
    fn parses_multipolygon_and_bbox() {
        let value = json!({
            "type": "Feature",
            "properties": { "name": "South Goa" },
            "bbox": [73.7, 14.9, 74.3, 15.5],
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                    [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]],
                ],
            },
        });
        let feature = parse_feature(&value).unwrap();
        assert_eq!(feature.geometry.0.len(), 2);
        let bbox = feature.bbox.unwrap();
        assert_eq!(bbox.min(), Coord { x: 73.7, y: 14.9 });
        assert_eq!(bbox.max(), Coord { x: 74.3, y: 15.5 });
    }

    #[test]
    fn non_polygonal_geometry_is_absent() {
        let value = json!({
            "type": "Feature",
            "properties": { "name": "HQ" },
            "geometry": { "type": "Point", "coordinates": [73.8, 15.4] },
        });
        assert!(parse_feature(&value).is_none());
    }

    #[test]
    fn collection_skips_bad_features() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                square_polygon_json("A"),
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
                square_polygon_json("B"),
            ],
        });
        let bytes = serde_json::to_vec(&collection).unwrap();
        let features = parse_feature_collection(&bytes).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "A");
        assert_eq!(features[1].name, "B");
    }

    #[test]
    fn open_rings_are_closed_on_parse() {
        let value = json!({
            "type": "Feature",
            "properties": { "name": "open" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [2.0, 0.0], [1.0, 2.0]]],
            },
        });
        let feature = parse_feature(&value).unwrap();
        let ring: Vec<_> = feature.geometry.0[0].exterior().coords().copied().collect();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn feature_json_round_trips() {
        let original = parse_feature(&json!({
            "type": "Feature",
            "properties": { "name": "North Goa" },
            "bbox": [73.7, 15.2, 74.1, 15.8],
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[73.7, 15.2], [74.1, 15.2], [74.1, 15.8], [73.7, 15.2]]]],
            },
        }))
        .unwrap();

        let restored = parse_feature(&feature_to_json(&original)).unwrap();
        assert_eq!(restored, original);
    }
}
