//! Region boundary used to reject out-of-territory POIs at ingestion time.
//!
//! The boundary polygons are held in an R-tree so a point-in-polygon check
//! only runs the exact containment test against polygons whose envelope
//! covers the point.

mod boundary;
mod index;

pub use boundary::{parse_boundary, RegionBoundary};
pub use index::RegionIndex;
