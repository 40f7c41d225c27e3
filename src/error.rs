//! Error type shared by ingestion and query paths.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodeError>;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Malformed or missing parameter (bad coordinates, empty query, unknown category)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Record lies outside the region boundary. Only raised during ingestion.
    #[error("point ({lon}, {lat}) is outside the region boundary")]
    OutOfRegion { lon: f64, lat: f64 },

    #[error("not found: {0}")]
    NotFound(String),

    /// A query arrived before any snapshot was published
    #[error("no index has been published yet")]
    IndexUnavailable,

    /// Raw dataset is empty or nothing in it could be parsed
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Osm(#[from] osmpbfreader::Error),
}

impl GeocodeError {
    /// Stable code for a transport layer to map onto its own status vocabulary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::OutOfRegion { .. } => "OUT_OF_REGION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::IndexUnavailable => "INDEX_UNAVAILABLE",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Toml(_) => "CONFIG_ERROR",
            Self::Osm(_) => "OSM_ERROR",
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
