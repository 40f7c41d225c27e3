//! Region boundary loading from GeoJSON.

use geo::{Coord, LineString, Polygon};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use super::RegionIndex;
use crate::error::{GeocodeError, Result};
use crate::models::{GeoBbox, GeoPoint};
use crate::source::read_to_string_maybe_gz;

type Ring = Vec<Vec<f64>>;

/// Subset of GeoJSON needed to describe polygonal territory
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonObject {
    FeatureCollection {
        features: Vec<GeoJsonObject>,
    },
    Feature {
        geometry: Option<Box<GeoJsonObject>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonObject>,
    },
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    #[serde(other)]
    Unsupported,
}

/// The territory POIs must fall inside to be ingested
pub struct RegionBoundary {
    index: RegionIndex,
    bbox: GeoBbox,
}

impl RegionBoundary {
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        let index = RegionIndex::build(polygons);
        let (min_lon, min_lat, max_lon, max_lat) = index
            .bounds()
            .ok_or_else(|| GeocodeError::invalid("region boundary contains no polygons"))?;
        Ok(Self {
            index,
            bbox: GeoBbox::new(min_lon, min_lat, max_lon, max_lat),
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading region boundary from {}", path.display());
        let content = read_to_string_maybe_gz(path)?;
        parse_boundary(&content)
    }

    /// Exact point-in-polygon test, not just the bounding box
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.bbox.contains(&point) && self.index.contains(point.lon, point.lat)
    }

    pub fn bbox(&self) -> GeoBbox {
        self.bbox
    }

    pub fn polygon_count(&self) -> usize {
        self.index.len()
    }
}

/// Parse a GeoJSON Polygon, MultiPolygon, Feature or FeatureCollection into a boundary
pub fn parse_boundary(json: &str) -> Result<RegionBoundary> {
    let object: GeoJsonObject = serde_json::from_str(json)?;
    let mut polygons = Vec::new();
    collect_polygons(object, &mut polygons);
    debug!("Parsed {} boundary polygons", polygons.len());
    RegionBoundary::from_polygons(polygons)
}

fn collect_polygons(object: GeoJsonObject, out: &mut Vec<Polygon<f64>>) {
    match object {
        GeoJsonObject::FeatureCollection { features } => {
            for f in features {
                collect_polygons(f, out);
            }
        }
        GeoJsonObject::Feature { geometry } => {
            if let Some(g) = geometry {
                collect_polygons(*g, out);
            }
        }
        GeoJsonObject::GeometryCollection { geometries } => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        GeoJsonObject::Polygon { coordinates } => out.extend(build_polygon(coordinates)),
        GeoJsonObject::MultiPolygon { coordinates } => {
            out.extend(coordinates.into_iter().filter_map(build_polygon));
        }
        GeoJsonObject::Unsupported => {}
    }
}

/// First ring is the exterior, the rest are holes
fn build_polygon(rings: Vec<Ring>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter().filter_map(build_ring);
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn build_ring(positions: Ring) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter(|p| p.len() >= 2 && p[0].is_finite() && p[1].is_finite())
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();

    // Polygon::new closes the ring if needed
    if coords.len() < 3 {
        return None;
    }
    Some(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISLAMABAD_ISH: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "test"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[72.9, 33.6], [73.2, 33.6], [73.2, 33.8], [72.9, 33.8], [72.9, 33.6]],
                    [[73.0, 33.65], [73.02, 33.65], [73.02, 33.67], [73.0, 33.67], [73.0, 33.65]]
                ]
            }
        }]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let region = parse_boundary(ISLAMABAD_ISH).unwrap();
        assert_eq!(region.polygon_count(), 1);
        assert!(region.contains(GeoPoint::new(73.05, 33.7)));
        // Inside the hole
        assert!(!region.contains(GeoPoint::new(73.01, 33.66)));
        assert!(!region.contains(GeoPoint::new(74.0, 33.7)));
    }

    #[test]
    fn test_bbox_alone_is_not_enough() {
        // Triangle: (0,0) (1,0) (0,1). (0.9, 0.9) is inside the bbox but outside the shape.
        let json = r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,1],[0,0]]]}"#;
        let region = parse_boundary(json).unwrap();
        assert!(region.bbox().contains(&GeoPoint::new(0.9, 0.9)));
        assert!(!region.contains(GeoPoint::new(0.9, 0.9)));
        assert!(region.contains(GeoPoint::new(0.2, 0.2)));
    }

    #[test]
    fn test_multipolygon_and_unsupported_geometries() {
        let json = r#"{"type": "GeometryCollection", "geometries": [
            {"type": "Point", "coordinates": [5, 5]},
            {"type": "MultiPolygon", "coordinates": [
                [[[0,0],[1,0],[1,1],[0,1]]],
                [[[10,10],[11,10],[11,11],[10,11],[10,10]]]
            ]}
        ]}"#;
        let region = parse_boundary(json).unwrap();
        assert_eq!(region.polygon_count(), 2);
        assert!(region.contains(GeoPoint::new(10.5, 10.5)));
        assert!(!region.contains(GeoPoint::new(5.0, 5.0)));
    }

    #[test]
    fn test_no_polygons_is_an_error() {
        let json = r#"{"type": "Point", "coordinates": [5, 5]}"#;
        assert!(parse_boundary(json).is_err());
    }
}
