//! GeoJSON point collections.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::models::{GeoPoint, RawPoiRecord, SourceFormat, SourceMeta};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollection {
    FeatureCollection { features: Vec<Value> },
    Bare(Vec<Value>),
}

/// Parse a FeatureCollection (or bare array of features) into raw records.
///
/// Individual features are read leniently: a missing or non-numeric geometry
/// becomes `coordinates: None` so the normalizer can count it. Only a document
/// that is not a feature list at all is an error.
pub fn parse_geojson_pois(json: &str, file_name: &str) -> Result<Vec<RawPoiRecord>> {
    let features = match serde_json::from_str::<RawCollection>(json)? {
        RawCollection::FeatureCollection { features } => features,
        RawCollection::Bare(features) => features,
    };

    let records: Vec<RawPoiRecord> = features
        .iter()
        .enumerate()
        .map(|(position, feature)| RawPoiRecord {
            id: feature_id(feature),
            tags: feature_tags(feature),
            coordinates: point_coordinates(&feature["geometry"]),
            source: SourceMeta {
                format: SourceFormat::GeoJson,
                file: file_name.to_string(),
                position,
            },
        })
        .collect();

    debug!("Parsed {} GeoJSON features", records.len());
    Ok(records)
}

fn feature_id(feature: &Value) -> Option<String> {
    let props = &feature["properties"];
    [&feature["id"], &props["@id"], &props["id"]]
        .into_iter()
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Scalar properties become tags; nested objects, arrays and nulls are dropped
fn feature_tags(feature: &Value) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    if let Some(props) = feature["properties"].as_object() {
        for (key, value) in props {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            tags.insert(key.clone(), value);
        }
    }
    tags
}

fn point_coordinates(geometry: &Value) -> Option<GeoPoint> {
    if geometry["type"].as_str() != Some("Point") {
        return None;
    }
    let coords = geometry["coordinates"].as_array()?;
    let lon = numeric(coords.first()?)?;
    let lat = numeric(coords.get(1)?)?;
    Some(GeoPoint::new(lon, lat))
}

/// Numbers, or strings holding a number
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "node/1",
                 "properties": {"name": "F-8 Markaz", "amenity": "marketplace", "levels": 2, "extra": {"a": 1}},
                 "geometry": {"type": "Point", "coordinates": [73.0479, 33.6844]}},
                {"type": "Feature",
                 "properties": {"@id": "node/2", "name": "Bad"},
                 "geometry": {"type": "Point", "coordinates": ["abc", 33.0]}},
                {"type": "Feature", "properties": {"name": "No geometry"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Stringy"},
                 "geometry": {"type": "Point", "coordinates": ["73.1", "33.7"]}}
            ]
        }"#;
        let records = parse_geojson_pois(json, "pois.geojson").unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].id.as_deref(), Some("node/1"));
        assert_eq!(records[0].tag("name"), Some("F-8 Markaz"));
        assert_eq!(records[0].tag("levels"), Some("2"));
        assert_eq!(records[0].tag("extra"), None);
        assert_eq!(records[0].coordinates, Some(GeoPoint::new(73.0479, 33.6844)));

        assert_eq!(records[1].id.as_deref(), Some("node/2"));
        assert!(records[1].coordinates.is_none());
        assert!(records[2].coordinates.is_none());
        assert_eq!(records[3].coordinates, Some(GeoPoint::new(73.1, 33.7)));
        assert_eq!(records[3].source.position, 3);
    }

    #[test]
    fn test_not_a_collection() {
        assert!(parse_geojson_pois(r#"{"type": "Feature"}"#, "x").is_err());
        assert!(parse_geojson_pois("not json", "x").is_err());
    }

    #[test]
    fn test_bare_array() {
        let records = parse_geojson_pois("[]", "x").unwrap();
        assert!(records.is_empty());
    }
}
