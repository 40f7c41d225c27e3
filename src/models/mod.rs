//! Core data models for the geocoding engine.

pub mod category;
pub mod poi;
pub mod report;

pub use category::CategoryGroup;
pub use poi::{CanonicalPoi, GeoBbox, GeoPoint, RawPoiRecord, SourceFormat, SourceMeta};
pub use report::{CanonicalDataset, IngestionReport};
