use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::index::DEFAULT_CELL_OCCUPANCY;
use crate::normalize::DEDUP_RADIUS_M;

pub const DEFAULT_BUFFER_SEGMENTS: usize = 64;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub index: IndexConfig,
    pub buffers: BufferConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Same-name POIs closer than this are merged
    pub dedup_radius_meters: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Expected POIs per grid cell
    pub target_cell_occupancy: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Vertices per buffer ring, closing vertex excluded
    pub segments: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dedup_radius_meters: DEDUP_RADIUS_M,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            target_cell_occupancy: DEFAULT_CELL_OCCUPANCY,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            segments: DEFAULT_BUFFER_SEGMENTS,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.ingest.dedup_radius_meters.is_finite() && self.ingest.dedup_radius_meters > 0.0) {
            anyhow::bail!("ingest.dedup_radius_meters must be a positive number");
        }
        if self.index.target_cell_occupancy == 0 {
            anyhow::bail!("index.target_cell_occupancy must be at least 1");
        }
        if self.buffers.segments < 3 {
            anyhow::bail!("buffers.segments must be at least 3");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ingest.dedup_radius_meters, 50.0);
        assert_eq!(config.index.target_cell_occupancy, 12);
        assert_eq!(config.buffers.segments, 64);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml("[buffers]\nsegments = 128\n").unwrap();
        assert_eq!(config.buffers.segments, 128);
        assert_eq!(config.index.target_cell_occupancy, 12);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_toml("[buffers]\nsegments = 2\n").is_err());
        assert!(Config::from_toml("[index]\ntarget_cell_occupancy = 0\n").is_err());
        assert!(Config::from_toml("[ingest]\ndedup_radius_meters = -1.0\n").is_err());
    }
}
