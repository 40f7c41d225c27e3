//! Near-duplicate removal: same normalized name within a small radius.

use hashbrown::HashMap;

use crate::geodesy::{distance_m, meters_per_degree_lon, METERS_PER_DEGREE_LAT};
use crate::models::GeoPoint;

/// Default duplicate radius in meters
pub const DEDUP_RADIUS_M: f64 = 50.0;

/// Anything that can be checked for duplication
pub trait DedupKey {
    fn dedup_name(&self) -> &str;
    fn dedup_point(&self) -> GeoPoint;
}

/// Coarse buckets at least `radius` across, so any pair closer than `radius`
/// lands in the same or an adjacent cell. Columns wrap at the antimeridian.
struct DedupGrid {
    lon_step: f64,
    lat_step: f64,
    cols: i64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl DedupGrid {
    fn new(radius_m: f64, max_abs_lat: f64) -> Self {
        let lat_step = radius_m / METERS_PER_DEGREE_LAT;
        // Narrowest longitude span across the data; small margin for asin(x) > x
        let lon_meters = meters_per_degree_lon(max_abs_lat.min(89.9)).max(1e-3);
        let min_lon_step = radius_m / lon_meters * 1.01;
        // Whole number of columns around the globe, each no narrower than the minimum
        let cols = ((360.0 / min_lon_step).floor() as i64).max(1);
        Self {
            lon_step: 360.0 / cols as f64,
            lat_step,
            cols,
            cells: HashMap::new(),
        }
    }

    fn cell(&self, p: GeoPoint) -> (i64, i64) {
        let col = ((p.lon + 180.0) / self.lon_step).floor() as i64;
        (col.rem_euclid(self.cols), (p.lat / self.lat_step).floor() as i64)
    }

    fn neighbours(&self, cell: (i64, i64)) -> impl Iterator<Item = usize> + '_ {
        let mut cols: Vec<i64> = (-1..=1).map(|dx| (cell.0 + dx).rem_euclid(self.cols)).collect();
        cols.sort_unstable();
        cols.dedup();
        cols.into_iter()
            .flat_map(move |c| (-1..=1).map(move |dy| (c, cell.1 + dy)))
            .filter_map(|c| self.cells.get(&c))
            .flatten()
            .copied()
    }

    fn insert(&mut self, cell: (i64, i64), idx: usize) {
        self.cells.entry(cell).or_default().push(idx);
    }
}

/// Keep the first occurrence of every (normalized name, < `radius_m`) cluster.
///
/// Input order decides which record survives. Each record is compared only
/// against already-kept records in its own and the 8 surrounding cells.
/// Returns the survivors and the number dropped.
pub fn dedup<T: DedupKey>(records: Vec<T>, radius_m: f64) -> (Vec<T>, usize) {
    let max_abs_lat = records
        .iter()
        .map(|r| r.dedup_point().lat.abs())
        .fold(0.0_f64, f64::max);

    let mut grid = DedupGrid::new(radius_m, max_abs_lat);
    let mut kept: Vec<T> = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        let point = record.dedup_point();
        let cell = grid.cell(point);

        let is_duplicate = grid.neighbours(cell).any(|i| {
            let other = &kept[i];
            other.dedup_name() == record.dedup_name()
                && distance_m(other.dedup_point(), point) < radius_m
        });

        if is_duplicate {
            dropped += 1;
            continue;
        }

        grid.insert(cell, kept.len());
        kept.push(record);
    }

    (kept, dropped)
}
