//! Uniform lon/lat grid over the POI bounding box.

use crate::geodesy::{min_distance_for_lat_gap, min_distance_for_lon_gap};
use crate::models::{GeoBbox, GeoPoint};

/// Upper bound on cells per axis
const MAX_CELLS_PER_AXIS: usize = 4096;

/// One grid bucket: positions into the indexed POI slice, in dataset order
#[derive(Debug, Default, Clone)]
pub(crate) struct GridCell {
    pub members: Vec<usize>,
}

/// Inclusive cell rectangle `[col0, col1] x [row0, row1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub col0: usize,
    pub col1: usize,
    pub row0: usize,
    pub row1: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Grid {
    bbox: GeoBbox,
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Size the grid so cells hold about `target_occupancy` points each.
    /// Tiny or zero-extent datasets get a single cell.
    pub fn build(points: &[GeoPoint], target_occupancy: usize) -> Self {
        let Some(bbox) = GeoBbox::enclosing(points) else {
            return Self {
                bbox: GeoBbox::new(0.0, 0.0, 0.0, 0.0),
                cols: 0,
                rows: 0,
                cell_w: 1.0,
                cell_h: 1.0,
                cells: Vec::new(),
            };
        };

        let width = bbox.max_lon - bbox.min_lon;
        let height = bbox.max_lat - bbox.min_lat;
        let cell_count = points.len().div_ceil(target_occupancy.max(1)).max(1);

        // Aim for roughly square cells on the ground, not in degrees
        let mid_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
        let ground_width = width * mid_lat.to_radians().cos();
        let (cols, rows) = if cell_count == 1 || (width <= 0.0 && height <= 0.0) {
            (1, 1)
        } else if ground_width <= 0.0 {
            (1, cell_count)
        } else if height <= 0.0 {
            (cell_count, 1)
        } else {
            let cols = ((cell_count as f64 * ground_width / height).sqrt().round() as usize)
                .clamp(1, cell_count);
            (cols, cell_count.div_ceil(cols))
        };
        let cols = cols.min(MAX_CELLS_PER_AXIS);
        let rows = rows.min(MAX_CELLS_PER_AXIS);

        let cell_w = if width > 0.0 { width / cols as f64 } else { 1.0 };
        let cell_h = if height > 0.0 { height / rows as f64 } else { 1.0 };

        let mut grid = Self {
            bbox,
            cols,
            rows,
            cell_w,
            cell_h,
            cells: vec![GridCell::default(); cols * rows],
        };

        for (pos, p) in points.iter().enumerate() {
            let (col, row) = grid.cell_of(*p);
            let slot = grid.slot(col, row);
            grid.cells[slot].members.push(pos);
        }

        grid
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn slot(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    fn col_of(&self, lon: f64) -> usize {
        let c = ((lon - self.bbox.min_lon) / self.cell_w).floor();
        if c.is_nan() || c < 0.0 {
            0
        } else {
            (c as usize).min(self.cols - 1)
        }
    }

    fn row_of(&self, lat: f64) -> usize {
        let r = ((lat - self.bbox.min_lat) / self.cell_h).floor();
        if r.is_nan() || r < 0.0 {
            0
        } else {
            (r as usize).min(self.rows - 1)
        }
    }

    /// Cell for a point, clamped into the grid for points outside it
    pub fn cell_of(&self, p: GeoPoint) -> (usize, usize) {
        (self.col_of(p.lon), self.row_of(p.lat))
    }

    pub fn cell(&self, col: usize, row: usize) -> &GridCell {
        &self.cells[self.slot(col, row)]
    }

    /// Cells at Chebyshev distance exactly `k` from `(col, row)`, inside the grid
    pub fn ring(&self, col: usize, row: usize, k: usize) -> Vec<(usize, usize)> {
        let (c, r, k) = (col as i64, row as i64, k as i64);
        let in_grid = |cc: i64, rr: i64| {
            cc >= 0 && rr >= 0 && (cc as usize) < self.cols && (rr as usize) < self.rows
        };

        if k == 0 {
            return vec![(col, row)];
        }

        let mut out = Vec::with_capacity(8 * k as usize);
        for dc in -k..=k {
            for dr in [-k, k] {
                if in_grid(c + dc, r + dr) {
                    out.push(((c + dc) as usize, (r + dr) as usize));
                }
            }
        }
        for dr in (-k + 1)..k {
            for dc in [-k, k] {
                if in_grid(c + dc, r + dr) {
                    out.push(((c + dc) as usize, (r + dr) as usize));
                }
            }
        }
        out
    }

    /// Cells covered by rings `0..=k` around `(col, row)`
    pub fn explored(&self, col: usize, row: usize, k: usize) -> CellRange {
        CellRange {
            col0: col.saturating_sub(k),
            col1: (col + k).min(self.cols - 1),
            row0: row.saturating_sub(k),
            row1: (row + k).min(self.rows - 1),
        }
    }

    /// Great-circle lower bound from `q` to any point in a cell outside `range`.
    ///
    /// None when `range` already covers the whole grid.
    pub fn unexplored_lower_bound(&self, q: GeoPoint, range: CellRange) -> Option<f64> {
        let west_edge = self.bbox.min_lon + range.col0 as f64 * self.cell_w;
        let east_edge = self.bbox.min_lon + (range.col1 + 1) as f64 * self.cell_w;
        let south_edge = self.bbox.min_lat + range.row0 as f64 * self.cell_h;
        let north_edge = self.bbox.min_lat + (range.row1 + 1) as f64 * self.cell_h;

        let mut bound: Option<f64> = None;
        let mut take = |d: f64| bound = Some(bound.map_or(d, |b: f64| b.min(d)));

        // Longitude gaps also measured the short way round the antimeridian
        if range.col0 > 0 {
            let gap = (q.lon - west_edge).min(360.0 - (q.lon - self.bbox.min_lon));
            take(min_distance_for_lon_gap(q, gap));
        }
        if range.col1 + 1 < self.cols {
            let gap = (east_edge - q.lon).min(360.0 - (self.bbox.max_lon - q.lon));
            take(min_distance_for_lon_gap(q, gap));
        }
        if range.row0 > 0 {
            take(min_distance_for_lat_gap(q.lat - south_edge));
        }
        if range.row1 + 1 < self.rows {
            take(min_distance_for_lat_gap(north_edge - q.lat));
        }
        bound
    }

    /// Cells whose extent may intersect `bbox`, None if it misses the grid
    pub fn cells_intersecting(&self, bbox: &GeoBbox) -> Option<CellRange> {
        if self.is_empty()
            || bbox.max_lon < self.bbox.min_lon
            || bbox.min_lon > self.bbox.max_lon
            || bbox.max_lat < self.bbox.min_lat
            || bbox.min_lat > self.bbox.max_lat
        {
            return None;
        }
        Some(CellRange {
            col0: self.col_of(bbox.min_lon),
            col1: self.col_of(bbox.max_lon),
            row0: self.row_of(bbox.min_lat),
            row1: self.row_of(bbox.max_lat),
        })
    }
}
