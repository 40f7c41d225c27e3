//! Raw and canonical POI records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CategoryGroup;

/// Geographic point (lon/lat, WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Finite and within the WGS84 lon/lat range
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

/// Axis-aligned bounding box in degrees. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBbox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box containing all points, None for an empty iterator
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => GeoBbox::new(p.lon, p.lat, p.lon, p.lat),
                Some(b) => GeoBbox::new(
                    b.min_lon.min(p.lon),
                    b.min_lat.min(p.lat),
                    b.max_lon.max(p.lon),
                    b.max_lat.max(p.lat),
                ),
            })
        })
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    pub fn is_valid(&self) -> bool {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lon <= self.max_lon
            && self.min_lat <= self.max_lat
    }
}

/// Input format a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    GeoJson,
    OsmPbf,
}

/// Where a raw record came from, for drop diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    pub format: SourceFormat,
    pub file: String,
    /// Zero-based position of the record in its source
    pub position: usize,
}

/// A POI as found in the raw dataset, before any cleaning.
///
/// `coordinates` is None when the source geometry is missing or not numeric.
#[derive(Debug, Clone)]
pub struct RawPoiRecord {
    pub id: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub coordinates: Option<GeoPoint>,
    pub source: SourceMeta,
}

impl RawPoiRecord {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_str())
    }
}

/// Cleaned, classified and deduplicated POI that all queries run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoi {
    /// Stable identifier, unique within a dataset
    pub id: String,

    /// Cleaned display name
    pub name: String,

    /// Lowercase, whitespace-collapsed name used for search and dedup
    pub normalized_name: String,

    pub category_group: CategoryGroup,

    pub coordinates: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_bbox() {
        let pts = [GeoPoint::new(73.0, 33.6), GeoPoint::new(73.2, 33.5)];
        let b = GeoBbox::enclosing(&pts).unwrap();
        assert_eq!(b, GeoBbox::new(73.0, 33.5, 73.2, 33.6));
        assert!(b.contains(&GeoPoint::new(73.2, 33.6)));
        assert!(!b.contains(&GeoPoint::new(73.21, 33.6)));
        assert!(GeoBbox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_point_validity() {
        assert!(GeoPoint::new(73.0, 33.6).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 33.6).is_valid());
        assert!(!GeoPoint::new(73.0, 91.0).is_valid());
    }
}
