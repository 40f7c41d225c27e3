//! Ingestion pipeline: raw records to the canonical dataset.
//!
//! Stages run in a fixed order: validate, clean, classify, dedup, assign ids.
//! The per-record stages run in parallel but are collected in input order,
//! so a given input ordering always produces the same output.

pub mod classify;
pub mod clean;
pub mod dedup;

pub use classify::{classify, matching_rule, ClassificationRule, ValuePattern, RULES};
pub use clean::{clean_name, clean_text, normalize_name, UNNAMED};
pub use dedup::{dedup, DedupKey, DEDUP_RADIUS_M};

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{GeocodeError, Result};
use crate::models::{
    CanonicalDataset, CanonicalPoi, CategoryGroup, GeoPoint, IngestionReport, RawPoiRecord,
};
use crate::region::RegionBoundary;

/// Drop a record whose coordinates are unusable or outside the region
pub fn validate(raw: &RawPoiRecord, region: &RegionBoundary) -> Result<GeoPoint> {
    let point = raw
        .coordinates
        .ok_or_else(|| GeocodeError::invalid("missing or non-numeric coordinates"))?;

    if !point.is_valid() {
        return Err(GeocodeError::invalid(format!(
            "coordinates out of range: ({}, {})",
            point.lon, point.lat
        )));
    }

    if !region.contains(point) {
        return Err(GeocodeError::OutOfRegion {
            lon: point.lon,
            lat: point.lat,
        });
    }

    Ok(point)
}

/// A record that passed validation, before dedup and id assignment
#[derive(Debug, Clone)]
struct Candidate {
    raw_id: Option<String>,
    name: String,
    normalized_name: String,
    category_group: CategoryGroup,
    point: GeoPoint,
}

impl DedupKey for Candidate {
    fn dedup_name(&self) -> &str {
        &self.normalized_name
    }

    fn dedup_point(&self) -> GeoPoint {
        self.point
    }
}

fn prepare(raw: &RawPoiRecord, region: &RegionBoundary) -> Result<Candidate> {
    let point = validate(raw, region)?;
    let name = clean_name(raw);
    let normalized_name = normalize_name(&name);
    let category_group = classify(&raw.tags);
    Ok(Candidate {
        raw_id: raw.id.clone(),
        name,
        normalized_name,
        category_group,
        point,
    })
}

/// Deterministic id for records without one
fn synthesize_id(c: &Candidate) -> String {
    let key = format!("{}|{:.7}|{:.7}", c.normalized_name, c.point.lon, c.point.lat);
    format!("poi/{:016x}", xxhash_rust::xxh64::xxh64(key.as_bytes(), 0))
}

/// Runs the ingestion stages against one region boundary
pub struct Normalizer<'a> {
    region: &'a RegionBoundary,
    dedup_radius_m: f64,
}

impl<'a> Normalizer<'a> {
    pub fn new(region: &'a RegionBoundary) -> Self {
        Self {
            region,
            dedup_radius_m: DEDUP_RADIUS_M,
        }
    }

    pub fn with_dedup_radius(mut self, meters: f64) -> Self {
        self.dedup_radius_m = meters;
        self
    }

    /// Build the canonical dataset.
    ///
    /// Bad records are skipped and counted. An empty input, or one where no
    /// record has usable coordinates, is an error.
    pub fn run(&self, records: &[RawPoiRecord]) -> Result<CanonicalDataset> {
        if records.is_empty() {
            return Err(GeocodeError::EmptyDataset("raw dataset has no records".to_string()));
        }
        if !(self.dedup_radius_m.is_finite() && self.dedup_radius_m > 0.0) {
            return Err(GeocodeError::invalid(format!(
                "dedup radius must be positive, got {}",
                self.dedup_radius_m
            )));
        }

        let mut report = IngestionReport {
            total_raw: records.len(),
            ..Default::default()
        };

        info!("Normalizing {} raw records...", records.len());

        let prepared: Vec<Result<Candidate>> = records
            .par_iter()
            .map(|raw| prepare(raw, self.region))
            .collect();

        let mut malformed = 0usize;
        let mut candidates = Vec::with_capacity(prepared.len());
        for (raw, result) in records.iter().zip(prepared) {
            match result {
                Ok(c) => candidates.push(c),
                Err(GeocodeError::OutOfRegion { lon, lat }) => {
                    debug!(
                        "Dropping {}#{} at ({}, {}): outside region",
                        raw.source.file, raw.source.position, lon, lat
                    );
                    report.out_of_region_dropped += 1;
                }
                Err(e) => {
                    debug!("Dropping {}#{}: {}", raw.source.file, raw.source.position, e);
                    malformed += 1;
                }
            }
        }
        report.invalid_dropped = malformed + report.out_of_region_dropped;

        if malformed == records.len() {
            return Err(GeocodeError::EmptyDataset(format!(
                "none of the {} raw records has usable coordinates",
                records.len()
            )));
        }

        let (survivors, duplicates) = dedup(candidates, self.dedup_radius_m);
        report.duplicates_dropped = duplicates;

        let pois = assign_ids(survivors);
        report.count_categories(&pois);

        info!(
            "Kept {} of {} records ({} duplicates, {} invalid, {} outside region)",
            report.total_kept,
            report.total_raw,
            report.duplicates_dropped,
            report.invalid_dropped,
            report.out_of_region_dropped
        );

        Ok(CanonicalDataset { report, pois })
    }
}

/// Raw id when present, otherwise a content hash; repeats get a `~n` suffix
fn assign_ids(candidates: Vec<Candidate>) -> Vec<CanonicalPoi> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    candidates
        .into_iter()
        .map(|c| {
            let base = c.raw_id.clone().unwrap_or_else(|| synthesize_id(&c));
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let id = if *count == 1 {
                base
            } else {
                format!("{}~{}", base, count)
            };
            CanonicalPoi {
                id,
                name: c.name,
                normalized_name: c.normalized_name,
                category_group: c.category_group,
                coordinates: c.point,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::destination;
    use crate::models::{SourceFormat, SourceMeta};
    use crate::region::parse_boundary;

    fn region() -> RegionBoundary {
        parse_boundary(
            r#"{"type": "Polygon", "coordinates": [[[72.8, 33.5], [73.3, 33.5], [73.3, 33.9], [72.8, 33.9], [72.8, 33.5]]]}"#,
        )
        .unwrap()
    }

    fn raw(id: Option<&str>, tags: &[(&str, &str)], point: Option<GeoPoint>) -> RawPoiRecord {
        RawPoiRecord {
            id: id.map(String::from),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            coordinates: point,
            source: SourceMeta {
                format: SourceFormat::GeoJson,
                file: "test.geojson".to_string(),
                position: 0,
            },
        }
    }

    #[test]
    fn test_faisal_mosque() {
        let region = region();
        let records = vec![raw(
            Some("node/1"),
            &[("name", " Faisal   Mosque "), ("religion", "islam")],
            Some(GeoPoint::new(73.0372, 33.7297)),
        )];
        let dataset = Normalizer::new(&region).run(&records).unwrap();
        let poi = &dataset.pois[0];
        assert_eq!(poi.name, "Faisal Mosque");
        assert_eq!(poi.normalized_name, "faisal mosque");
        assert_eq!(poi.category_group, CategoryGroup::Religious);
        assert_eq!(poi.id, "node/1");
    }

    #[test]
    fn test_centaurus_duplicates() {
        let region = region();
        let a = GeoPoint::new(73.0496, 33.7077);
        let b = destination(a, 90.0, 10.0);
        let records = vec![
            raw(Some("node/1"), &[("name", "Centaurus Mall"), ("shop", "mall")], Some(a)),
            raw(Some("node/2"), &[("name", "Centaurus  Mall"), ("shop", "mall")], Some(b)),
        ];
        let dataset = Normalizer::new(&region).run(&records).unwrap();
        assert_eq!(dataset.pois.len(), 1);
        assert_eq!(dataset.pois[0].id, "node/1");
        assert_eq!(dataset.report.duplicates_dropped, 1);
    }

    #[test]
    fn test_drops_are_counted() {
        let region = region();
        let records = vec![
            raw(None, &[("name", "Good")], Some(GeoPoint::new(73.0, 33.7))),
            raw(None, &[("name", "No coords")], None),
            raw(None, &[("name", "Lahore")], Some(GeoPoint::new(74.3, 31.5))),
            raw(None, &[("name", "Broken")], Some(GeoPoint::new(f64::NAN, 33.7))),
        ];
        let dataset = Normalizer::new(&region).run(&records).unwrap();
        let r = &dataset.report;
        assert_eq!(r.total_raw, 4);
        assert_eq!(r.total_kept, 1);
        assert_eq!(r.invalid_dropped, 3);
        assert_eq!(r.out_of_region_dropped, 1);
        assert_eq!(r.category_counts[&CategoryGroup::Other], 1);
        assert_eq!(r.category_counts[&CategoryGroup::Health], 0);
        assert!(dataset.pois[0].id.starts_with("poi/"));
    }

    #[test]
    fn test_empty_and_unparsable_are_fatal() {
        let region = region();
        assert!(matches!(
            Normalizer::new(&region).run(&[]),
            Err(GeocodeError::EmptyDataset(_))
        ));
        let records = vec![raw(None, &[("name", "a")], None), raw(None, &[("name", "b")], None)];
        assert!(matches!(
            Normalizer::new(&region).run(&records),
            Err(GeocodeError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_all_outside_region_is_not_fatal() {
        let region = region();
        let records = vec![raw(None, &[("name", "Lahore")], Some(GeoPoint::new(74.3, 31.5)))];
        let dataset = Normalizer::new(&region).run(&records).unwrap();
        assert!(dataset.pois.is_empty());
        assert_eq!(dataset.report.out_of_region_dropped, 1);
    }

    #[test]
    fn test_repeated_raw_ids_are_suffixed() {
        let region = region();
        let records = vec![
            raw(Some("node/7"), &[("name", "A")], Some(GeoPoint::new(73.0, 33.7))),
            raw(Some("node/7"), &[("name", "B")], Some(GeoPoint::new(73.1, 33.7))),
        ];
        let dataset = Normalizer::new(&region).run(&records).unwrap();
        let ids: Vec<&str> = dataset.pois.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["node/7", "node/7~2"]);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let region = region();
        let records: Vec<RawPoiRecord> = (0..200)
            .map(|i| {
                let p = GeoPoint::new(72.9 + (i % 20) as f64 * 0.01, 33.6 + (i / 20) as f64 * 0.01);
                raw(None, &[("name", if i % 3 == 0 { "Shop" } else { "Clinic" }), ("amenity", "clinic")], Some(p))
            })
            .collect();
        let first = Normalizer::new(&region).run(&records).unwrap().to_json().unwrap();
        let second = Normalizer::new(&region).run(&records).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}
