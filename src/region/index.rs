//! R-tree over region polygons for exact point-in-polygon lookups.

use geo::{BoundingRect, Contains, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

/// Wrapper for R-tree indexing of one boundary polygon
struct IndexedPolygon {
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPolygon {
    fn new(polygon: Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        Some(Self {
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            polygon,
        })
    }
}

/// Spatial index over the polygons making up a region
pub struct RegionIndex {
    tree: RTree<IndexedPolygon>,
}

impl RegionIndex {
    pub fn build(polygons: Vec<Polygon<f64>>) -> Self {
        let indexed: Vec<IndexedPolygon> = polygons
            .into_iter()
            .filter_map(IndexedPolygon::new)
            .collect();
        let tree = RTree::bulk_load(indexed);
        info!("Region index built with {} polygons", tree.size());
        Self { tree }
    }

    /// True point-in-polygon: envelope candidates first, then exact containment
    /// (holes excluded).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .any(|ip| ip.polygon.contains(&point))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Envelope of every polygon as (min_lon, min_lat, max_lon, max_lat)
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let env = self.tree.root().envelope();
        let (lower, upper) = (env.lower(), env.upper());
        Some((lower[0], lower[1], upper[0], upper[1]))
    }
}
