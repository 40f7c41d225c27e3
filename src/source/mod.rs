//! Raw POI readers.
//!
//! GeoJSON collections and OSM PBF extracts are both turned into
//! [`RawPoiRecord`]s; nothing is cleaned or rejected here beyond what is
//! needed to read the file.

mod geojson;
mod osm;

pub use geojson::parse_geojson_pois;
pub use osm::{is_poi_tagged, read_osm_pbf};

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::RawPoiRecord;

/// Read a text file, transparently gunzipping `.gz` files
pub fn read_to_string_maybe_gz(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    Ok(content)
}

/// Load raw records, picking the reader from the file name
pub fn load_raw_records(path: &Path) -> Result<Vec<RawPoiRecord>> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let records = if file_name.ends_with(".pbf") {
        read_osm_pbf(path, &file_name)?
    } else {
        let content = read_to_string_maybe_gz(path)?;
        parse_geojson_pois(&content, &file_name)?
    };

    info!("Loaded {} raw records from {}", records.len(), file_name);
    Ok(records)
}
