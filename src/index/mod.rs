//! Spatial index over the canonical dataset.
//!
//! A uniform grid answers nearest-neighbor and range queries; a secondary
//! per-category map answers category membership in O(1). The index never
//! changes after [`SpatialIndex::build`].

mod grid;

use hashbrown::HashMap;
use std::sync::Arc;
use tracing::info;

use self::grid::Grid;
use crate::geodesy::distance_m;
use crate::models::{CanonicalPoi, CategoryGroup, GeoBbox, GeoPoint};

/// Expected POIs per grid cell
pub const DEFAULT_CELL_OCCUPANCY: usize = 12;

/// A nearest-neighbor hit
#[derive(Debug, Clone, Copy)]
pub struct Nearest<'a> {
    pub poi: &'a CanonicalPoi,
    pub distance_m: f64,
}

pub struct SpatialIndex {
    pois: Arc<[CanonicalPoi]>,
    grid: Grid,
    by_category: HashMap<CategoryGroup, Vec<usize>>,
}

impl SpatialIndex {
    pub fn build(pois: Arc<[CanonicalPoi]>, target_occupancy: usize) -> Self {
        info!("Building spatial index for {} POIs...", pois.len());

        let points: Vec<GeoPoint> = pois.iter().map(|p| p.coordinates).collect();
        let grid = Grid::build(&points, target_occupancy);

        let mut by_category: HashMap<CategoryGroup, Vec<usize>> = HashMap::new();
        for (pos, poi) in pois.iter().enumerate() {
            by_category.entry(poi.category_group).or_default().push(pos);
        }

        let (cols, rows) = grid.dimensions();
        info!("Spatial index built: {}x{} grid", cols, rows);
        for group in CategoryGroup::all() {
            if let Some(members) = by_category.get(group) {
                info!("  {}: {} POIs", group, members.len());
            }
        }

        Self {
            pois,
            grid,
            by_category,
        }
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub fn pois(&self) -> &[CanonicalPoi] {
        &self.pois
    }

    /// Closest POI by great-circle distance; ties go to the earlier POI.
    ///
    /// Expands ring by ring from the point's home cell and stops as soon as no
    /// unexplored cell can hold anything closer than the current best.
    pub fn query_nearest(&self, point: GeoPoint) -> Option<Nearest<'_>> {
        if self.grid.is_empty() {
            return self.scan_nearest(point);
        }

        let (cols, rows) = self.grid.dimensions();
        let (home_col, home_row) = self.grid.cell_of(point);
        let mut best: Option<(f64, usize)> = None;

        for k in 0..cols.max(rows) {
            for (col, row) in self.grid.ring(home_col, home_row, k) {
                for &pos in &self.grid.cell(col, row).members {
                    let d = distance_m(point, self.pois[pos].coordinates);
                    let better = match best {
                        None => true,
                        Some((bd, bp)) => d < bd || (d == bd && pos < bp),
                    };
                    if better {
                        best = Some((d, pos));
                    }
                }
            }

            let explored = self.grid.explored(home_col, home_row, k);
            match self.grid.unexplored_lower_bound(point, explored) {
                None => break,
                Some(bound) => {
                    if matches!(best, Some((bd, _)) if bd < bound) {
                        break;
                    }
                }
            }
        }

        best.map(|(distance_m, pos)| Nearest {
            poi: &self.pois[pos],
            distance_m,
        })
    }

    /// Linear scan; only used when there is no grid
    fn scan_nearest(&self, point: GeoPoint) -> Option<Nearest<'_>> {
        self.pois
            .iter()
            .map(|poi| Nearest {
                poi,
                distance_m: distance_m(point, poi.coordinates),
            })
            .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
    }

    /// Positions of POIs inside `bbox` (edges inclusive), in dataset order
    fn range_positions(&self, bbox: &GeoBbox) -> Vec<usize> {
        let Some(range) = self.grid.cells_intersecting(bbox) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for row in range.row0..=range.row1 {
            for col in range.col0..=range.col1 {
                out.extend(
                    self.grid
                        .cell(col, row)
                        .members
                        .iter()
                        .copied()
                        .filter(|&pos| bbox.contains(&self.pois[pos].coordinates)),
                );
            }
        }
        out.sort_unstable();
        out
    }

    /// POIs inside `bbox`, visiting only the cells it overlaps
    pub fn query_range(&self, bbox: &GeoBbox) -> Vec<&CanonicalPoi> {
        self.range_positions(bbox)
            .into_iter()
            .map(|pos| &self.pois[pos])
            .collect()
    }

    /// POIs of one category, optionally restricted to a bbox
    pub fn query_category(&self, group: CategoryGroup, within: Option<&GeoBbox>) -> Vec<&CanonicalPoi> {
        let Some(members) = self.by_category.get(&group) else {
            return Vec::new();
        };

        match within {
            None => members.iter().map(|&pos| &self.pois[pos]).collect(),
            Some(bbox) => self
                .range_positions(bbox)
                .into_iter()
                .filter(|&pos| self.pois[pos].category_group == group)
                .map(|pos| &self.pois[pos])
                .collect(),
        }
    }

    pub fn category_count(&self, group: CategoryGroup) -> usize {
        self.by_category.get(&group).map_or(0, |m| m.len())
    }
}
