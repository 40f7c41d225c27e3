//! Forward (name) search and reverse geocoding.

use serde::Serialize;

use crate::error::{GeocodeError, Result};
use crate::geodesy::round_km;
use crate::index::SpatialIndex;
use crate::models::{CanonicalPoi, CategoryGroup, GeoPoint};
use crate::normalize::normalize_name;

/// Maximum number of name search results
pub const MAX_SEARCH_RESULTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub category_group: CategoryGroup,
    pub coordinates: GeoPoint,
}

impl From<&CanonicalPoi> for SearchHit {
    fn from(poi: &CanonicalPoi) -> Self {
        Self {
            id: poi.id.clone(),
            name: poi.name.clone(),
            category_group: poi.category_group,
            coordinates: poi.coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseResult {
    pub id: String,
    pub name: String,
    pub category_group: CategoryGroup,
    pub coordinates: GeoPoint,
    /// Great-circle distance, rounded to 2 decimals
    pub distance_km: f64,
}

/// Substring match on normalized names.
///
/// Order: prefix matches, then earlier match position, then alphabetical by
/// normalized name, then dataset order. Zero matches is an empty list.
pub fn search_by_name(index: &SpatialIndex, query: &str) -> Result<Vec<SearchHit>> {
    let needle = normalize_name(query);
    if needle.is_empty() {
        return Err(GeocodeError::invalid("search query is empty"));
    }

    let mut matches: Vec<(usize, usize, &CanonicalPoi)> = index
        .pois()
        .iter()
        .enumerate()
        .filter_map(|(pos, poi)| {
            let name = &poi.normalized_name;
            // Rank on character position; `find` gives a byte offset
            name.find(&needle).map(|at| (name[..at].chars().count(), pos, poi))
        })
        .collect();

    // Position 0 is the prefix match, so sorting by position puts prefixes first
    matches.sort_by(|(at_a, pos_a, a), (at_b, pos_b, b)| {
        at_a.cmp(at_b)
            .then_with(|| a.normalized_name.cmp(&b.normalized_name))
            .then_with(|| pos_a.cmp(pos_b))
    });

    Ok(matches
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|(_, _, poi)| SearchHit::from(poi))
        .collect())
}

/// Nearest POI to a point. Distance is not capped: a point far outside the
/// region still gets an answer.
pub fn reverse_geocode(index: &SpatialIndex, lat: f64, lon: f64) -> Result<ReverseResult> {
    let point = GeoPoint::new(lon, lat);
    if !point.is_valid() {
        return Err(GeocodeError::invalid(format!(
            "coordinates out of range: lat={}, lon={}",
            lat, lon
        )));
    }

    let nearest = index
        .query_nearest(point)
        .ok_or_else(|| GeocodeError::NotFound("index holds no POIs".to_string()))?;

    Ok(ReverseResult {
        id: nearest.poi.id.clone(),
        name: nearest.poi.name.clone(),
        category_group: nearest.poi.category_group,
        coordinates: nearest.poi.coordinates,
        distance_km: round_km(nearest.distance_m),
    })
}
