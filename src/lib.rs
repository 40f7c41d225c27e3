//! Deodar - a regional POI geocoder
//!
//! This library provides the ingestion pipeline, spatial index and query
//! engine shared by the ingest and query binaries.

pub mod config;
pub mod engine;
pub mod error;
pub mod geodesy;
pub mod index;
pub mod models;
pub mod normalize;
pub mod region;
pub mod source;

pub use config::Config;
pub use engine::{BufferPolygon, Geocoder, ReverseResult, SearchHit, Snapshot};
pub use error::{GeocodeError, Result};
pub use index::SpatialIndex;
pub use models::{CanonicalDataset, CanonicalPoi, CategoryGroup, GeoBbox, GeoPoint, IngestionReport, RawPoiRecord};
pub use normalize::Normalizer;
pub use region::RegionBoundary;
