//! Query engine over published snapshots.
//!
//! A [`Snapshot`] bundles the canonical POIs, their spatial index and the
//! ingestion report. Snapshots are immutable; the [`Geocoder`] swaps in a new
//! one on publish, and every query runs start to finish against the snapshot
//! it picked up when it began.

pub mod buffer;
pub mod search;

pub use buffer::{generate_buffers, to_feature_collection, BufferPolygon};
pub use search::{reverse_geocode, search_by_name, ReverseResult, SearchHit, MAX_SEARCH_RESULTS};

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

use crate::config::{BufferConfig, Config, IndexConfig};
use crate::error::{GeocodeError, Result};
use crate::index::SpatialIndex;
use crate::models::{CanonicalDataset, CategoryGroup, IngestionReport};

type BufferKey = (CategoryGroup, u64);

/// Distinct (category, radius) buffer sets a snapshot keeps; further ones are computed per call
pub const MAX_CACHED_BUFFER_SETS: usize = 64;

/// Immutable, query-ready view of one ingestion run
pub struct Snapshot {
    index: SpatialIndex,
    report: IngestionReport,
    built_at: DateTime<Utc>,
    buffer_segments: usize,
    /// Memoized buffers; valid for the lifetime of this snapshot only
    buffer_cache: Mutex<HashMap<BufferKey, Arc<Vec<BufferPolygon>>>>,
}

impl Snapshot {
    pub fn build(dataset: CanonicalDataset, index: &IndexConfig, buffers: &BufferConfig) -> Self {
        let CanonicalDataset { report, pois } = dataset;
        Self {
            index: SpatialIndex::build(pois.into(), index.target_cell_occupancy),
            report,
            built_at: Utc::now(),
            buffer_segments: buffers.segments,
            buffer_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn report(&self) -> &IngestionReport {
        &self.report
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        search_by_name(&self.index, query)
    }

    pub fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseResult> {
        reverse_geocode(&self.index, lat, lon)
    }

    /// Buffers for every POI in `group`, memoized per (group, radius)
    pub fn buffers(&self, group: CategoryGroup, radius_meters: f64) -> Result<Arc<Vec<BufferPolygon>>> {
        buffer::check_radius(radius_meters)?;
        let key = (group, radius_meters.to_bits());

        if let Some(hit) = self.cache().get(&key) {
            debug!("Buffer cache hit for {} @ {} m", group, radius_meters);
            return Ok(Arc::clone(hit));
        }

        // Computed outside the lock; a concurrent miss just computes the same value
        let pois = self.index.query_category(group, None);
        let generated = Arc::new(generate_buffers(&pois, radius_meters, self.buffer_segments)?);
        debug!(
            "Generated {} buffers for {} @ {} m",
            generated.len(),
            group,
            radius_meters
        );

        let mut cache = self.cache();
        if let Some(existing) = cache.get(&key) {
            return Ok(Arc::clone(existing));
        }
        if cache.len() >= MAX_CACHED_BUFFER_SETS {
            debug!("Buffer cache full; not memoizing {} @ {} m", group, radius_meters);
            return Ok(generated);
        }
        cache.insert(key, Arc::clone(&generated));
        Ok(generated)
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<BufferKey, Arc<Vec<BufferPolygon>>>> {
        self.buffer_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Entry point for callers: owns the currently published snapshot
pub struct Geocoder {
    index_config: IndexConfig,
    buffer_config: BufferConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Geocoder {
    pub fn new(config: &Config) -> Self {
        Self {
            index_config: config.index.clone(),
            buffer_config: config.buffers.clone(),
            current: RwLock::new(None),
        }
    }

    /// Build a snapshot without publishing it
    pub fn build(&self, dataset: CanonicalDataset) -> Snapshot {
        Snapshot::build(dataset, &self.index_config, &self.buffer_config)
    }

    /// Replace the current snapshot wholesale. Queries already running keep
    /// the snapshot they started with.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(Arc::clone(&snapshot));
        info!(
            "Published snapshot with {} POIs (built {})",
            snapshot.index().len(),
            snapshot.built_at().to_rfc3339()
        );
        snapshot
    }

    pub fn build_and_publish(&self, dataset: CanonicalDataset) -> Arc<Snapshot> {
        let snapshot = self.build(dataset);
        self.publish(snapshot)
    }

    /// The snapshot queries should run against
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(GeocodeError::IndexUnavailable)
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.snapshot()?.search(query)
    }

    pub fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseResult> {
        self.snapshot()?.reverse(lat, lon)
    }

    pub fn buffers(&self, group: CategoryGroup, radius_meters: f64) -> Result<Arc<Vec<BufferPolygon>>> {
        self.snapshot()?.buffers(group, radius_meters)
    }

    pub fn ingestion_report(&self) -> Result<IngestionReport> {
        Ok(self.snapshot()?.report().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalPoi, GeoPoint};
    use crate::normalize::normalize_name;

    fn dataset(entries: &[(&str, CategoryGroup, f64, f64)]) -> CanonicalDataset {
        let pois: Vec<CanonicalPoi> = entries
            .iter()
            .enumerate()
            .map(|(i, (name, group, lon, lat))| CanonicalPoi {
                id: format!("poi/{}", i),
                name: name.to_string(),
                normalized_name: normalize_name(name),
                category_group: *group,
                coordinates: GeoPoint::new(*lon, *lat),
            })
            .collect();
        let mut report = IngestionReport {
            total_raw: pois.len(),
            ..Default::default()
        };
        report.count_categories(&pois);
        CanonicalDataset { report, pois }
    }

    #[test]
    fn test_unpublished_is_unavailable() {
        let geocoder = Geocoder::default();
        assert!(matches!(geocoder.search("mark"), Err(GeocodeError::IndexUnavailable)));
        assert!(matches!(geocoder.reverse(33.7, 73.0), Err(GeocodeError::IndexUnavailable)));
        assert!(matches!(geocoder.ingestion_report(), Err(GeocodeError::IndexUnavailable)));
        assert!(matches!(
            geocoder.buffers(CategoryGroup::Health, 500.0),
            Err(GeocodeError::IndexUnavailable)
        ));
    }

    #[test]
    fn test_publish_swaps_wholesale() {
        let geocoder = Geocoder::default();
        geocoder.build_and_publish(dataset(&[("F-8 Markaz", CategoryGroup::Commercial, 73.0479, 33.6844)]));

        let held = geocoder.snapshot().unwrap();
        geocoder.build_and_publish(dataset(&[("Faisal Mosque", CategoryGroup::Religious, 73.0372, 33.7297)]));

        // The old snapshot is untouched; new queries see the new data
        assert_eq!(held.search("markaz").unwrap().len(), 1);
        assert!(geocoder.search("markaz").unwrap().is_empty());
        assert_eq!(geocoder.reverse(33.7297, 73.0372).unwrap().name, "Faisal Mosque");
    }

    #[test]
    fn test_empty_snapshot_reverse_not_found() {
        let geocoder = Geocoder::default();
        geocoder.build_and_publish(dataset(&[]));
        assert!(matches!(geocoder.reverse(33.7, 73.0), Err(GeocodeError::NotFound(_))));
        assert!(geocoder.search("x").unwrap().is_empty());
    }

    #[test]
    fn test_buffers_memoized_per_category_and_radius() {
        let geocoder = Geocoder::default();
        geocoder.build_and_publish(dataset(&[
            ("PIMS", CategoryGroup::Health, 73.0551, 33.7050),
            ("Shifa", CategoryGroup::Health, 73.0626, 33.6756),
            ("F-8 Markaz", CategoryGroup::Commercial, 73.0479, 33.6844),
        ]));

        let first = geocoder.buffers(CategoryGroup::Health, 500.0).unwrap();
        let again = geocoder.buffers(CategoryGroup::Health, 500.0).unwrap();
        let wider = geocoder.buffers(CategoryGroup::Health, 800.0).unwrap();
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &wider));
        assert!(geocoder.buffers(CategoryGroup::Park, 500.0).unwrap().is_empty());
        assert!(geocoder.buffers(CategoryGroup::Health, -5.0).is_err());
    }

    #[test]
    fn test_buffer_cache_is_bounded() {
        let geocoder = Geocoder::default();
        geocoder.build_and_publish(dataset(&[("PIMS", CategoryGroup::Health, 73.0551, 33.7050)]));
        let snapshot = geocoder.snapshot().unwrap();

        let first = snapshot.buffers(CategoryGroup::Health, 100.0).unwrap();
        for i in 1..(MAX_CACHED_BUFFER_SETS * 2) {
            let radius = 100.0 + i as f64;
            assert_eq!(snapshot.buffers(CategoryGroup::Health, radius).unwrap().len(), 1);
        }
        assert_eq!(snapshot.cache().len(), MAX_CACHED_BUFFER_SETS);

        // Early entries stay memoized; radii past the cap are still answered
        assert!(Arc::ptr_eq(&first, &snapshot.buffers(CategoryGroup::Health, 100.0).unwrap()));
        let late = 100.0 + (MAX_CACHED_BUFFER_SETS * 2 - 1) as f64;
        let a = snapshot.buffers(CategoryGroup::Health, late).unwrap();
        let b = snapshot.buffers(CategoryGroup::Health, late).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_passthrough() {
        let geocoder = Geocoder::default();
        geocoder.build_and_publish(dataset(&[("PIMS", CategoryGroup::Health, 73.0551, 33.7050)]));
        let report = geocoder.ingestion_report().unwrap();
        assert_eq!(report.total_kept, 1);
        assert_eq!(report.category_counts[&CategoryGroup::Health], 1);
    }

    #[test]
    fn test_concurrent_readers_during_publish() {
        let geocoder = Arc::new(Geocoder::default());
        geocoder.build_and_publish(dataset(&[("Alpha", CategoryGroup::Other, 73.0, 33.7)]));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let g = Arc::clone(&geocoder);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = g.snapshot().unwrap();
                        // Each snapshot is internally consistent: one POI, found by reverse
                        let hit = snap.reverse(33.7, 73.0).unwrap();
                        assert_eq!(snap.index().len(), 1);
                        assert!(hit.name == "Alpha" || hit.name == "Beta");
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            geocoder.build_and_publish(dataset(&[("Beta", CategoryGroup::Other, 73.0, 33.7)]));
        }
        for r in readers {
            r.join().unwrap();
        }
    }
}
