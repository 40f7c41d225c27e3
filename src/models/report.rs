//! Ingestion report and the serialized canonical dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CanonicalPoi, CategoryGroup};

/// Counters describing one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub total_raw: usize,
    pub total_kept: usize,
    pub duplicates_dropped: usize,
    /// Every record dropped by validation, out-of-region ones included
    pub invalid_dropped: usize,
    pub out_of_region_dropped: usize,
    pub category_counts: BTreeMap<CategoryGroup, usize>,
}

impl IngestionReport {
    /// Recount categories from the kept POIs. Every group gets an entry.
    pub fn count_categories(&mut self, pois: &[CanonicalPoi]) {
        self.category_counts = CategoryGroup::all().iter().map(|g| (*g, 0)).collect();
        for poi in pois {
            *self.category_counts.entry(poi.category_group).or_default() += 1;
        }
        self.total_kept = pois.len();
    }
}

/// On-disk artifact produced by `ingest` and loaded by `query`.
///
/// Holds no timestamps: identical raw input yields identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDataset {
    pub report: IngestionReport,
    pub pois: Vec<CanonicalPoi>,
}

impl CanonicalDataset {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// xxh64 over the serialized form, logged to compare runs
    pub fn fingerprint(&self) -> serde_json::Result<u64> {
        let json = serde_json::to_vec(self)?;
        Ok(xxhash_rust::xxh64::xxh64(&json, 0))
    }
}
