//! OSM PBF extracts. Only tagged nodes are read; way and relation POIs are skipped.

use osmpbfreader::{OsmObj, OsmPbfReader};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{GeoPoint, RawPoiRecord, SourceFormat, SourceMeta};

/// Tag keys that mark a node as a point of interest
const POI_KEYS: &[&str] = &[
    "name",
    "amenity",
    "shop",
    "tourism",
    "leisure",
    "healthcare",
    "religion",
    "historic",
    "office",
    "public_transport",
    "railway",
    "aeroway",
];

pub fn is_poi_tagged<'a>(mut keys: impl Iterator<Item = &'a str>) -> bool {
    keys.any(|k| POI_KEYS.contains(&k))
}

pub fn read_osm_pbf(path: &Path, file_name: &str) -> Result<Vec<RawPoiRecord>> {
    let file = File::open(path)?;
    let mut reader = OsmPbfReader::new(BufReader::new(file));

    let mut records = Vec::new();
    let mut read_errors = 0usize;

    for obj in reader.iter() {
        let obj = match obj {
            Ok(o) => o,
            Err(e) => {
                warn!("Error reading OSM object: {}", e);
                read_errors += 1;
                continue;
            }
        };

        let node = match obj {
            OsmObj::Node(node) => node,
            _ => continue,
        };

        if !is_poi_tagged(node.tags.iter().map(|(k, _)| k.as_str())) {
            continue;
        }

        let tags: BTreeMap<String, String> = node
            .tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let position = records.len();
        records.push(RawPoiRecord {
            id: Some(format!("node/{}", node.id.0)),
            tags,
            coordinates: Some(GeoPoint::new(node.lon(), node.lat())),
            source: SourceMeta {
                format: SourceFormat::OsmPbf,
                file: file_name.to_string(),
                position,
            },
        });
    }

    info!(
        "Read {} POI nodes from {} ({} unreadable objects)",
        records.len(),
        file_name,
        read_errors
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poi_tagged() {
        assert!(is_poi_tagged(["highway", "amenity"].into_iter()));
        assert!(is_poi_tagged(["name"].into_iter()));
        assert!(!is_poi_tagged(["highway", "surface"].into_iter()));
    }
}
