//! Geodesic proximity buffers around POIs.

use geo::{Coord, LineString, Polygon};
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::error::{GeocodeError, Result};
use crate::geodesy::destination;
use crate::models::{CanonicalPoi, CategoryGroup};

/// Closed ring approximating a circle of `radius_meters` around one POI
#[derive(Debug, Clone, PartialEq)]
pub struct BufferPolygon {
    pub poi_id: String,
    pub poi_name: String,
    pub category_group: CategoryGroup,
    pub radius_meters: f64,
    pub polygon: Polygon<f64>,
}

impl BufferPolygon {
    pub fn ring(&self) -> &LineString<f64> {
        self.polygon.exterior()
    }

    pub fn to_geojson_feature(&self) -> Value {
        let ring: Vec<[f64; 2]> = self.ring().coords().map(|c| [c.x, c.y]).collect();
        json!({
            "type": "Feature",
            "properties": {
                "poi_id": self.poi_id,
                "name": self.poi_name,
                "category_group": self.category_group,
                "radius_meters": self.radius_meters,
            },
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            }
        })
    }
}

/// Render buffers as a GeoJSON FeatureCollection
pub fn to_feature_collection(buffers: &[BufferPolygon]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": buffers.iter().map(BufferPolygon::to_geojson_feature).collect::<Vec<_>>(),
    })
}

pub fn check_radius(radius_meters: f64) -> Result<()> {
    if !(radius_meters.is_finite() && radius_meters > 0.0) {
        return Err(GeocodeError::invalid(format!(
            "buffer radius must be a positive number of meters, got {}",
            radius_meters
        )));
    }
    Ok(())
}

/// Ring vertices are geodesic destinations at evenly spaced bearings, so the
/// longitude span widens with latitude the way a real circle on the ground does.
pub fn buffer_for(poi: &CanonicalPoi, radius_meters: f64, segments: usize) -> BufferPolygon {
    let segments = segments.max(3);
    let mut coords: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let bearing = 360.0 * i as f64 / segments as f64;
            let p = destination(poi.coordinates, bearing, radius_meters);
            Coord { x: p.lon, y: p.lat }
        })
        .collect();
    coords.push(coords[0]);

    BufferPolygon {
        poi_id: poi.id.clone(),
        poi_name: poi.name.clone(),
        category_group: poi.category_group,
        radius_meters,
        polygon: Polygon::new(LineString::new(coords), vec![]),
    }
}

/// One buffer per POI, in the order given. Computed in parallel.
pub fn generate_buffers(
    pois: &[&CanonicalPoi],
    radius_meters: f64,
    segments: usize,
) -> Result<Vec<BufferPolygon>> {
    check_radius(radius_meters)?;
    Ok(pois
        .par_iter()
        .map(|poi| buffer_for(poi, radius_meters, segments))
        .collect())
}
