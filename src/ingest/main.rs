//! Batch ingest pipeline.
//!
//! Reads a raw POI dump (GeoJSON or OSM PBF) and a region boundary, runs the
//! normalizer, and writes the canonical dataset the query binary loads.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deodar::config::Config;
use deodar::models::CategoryGroup;
use deodar::normalize::Normalizer;
use deodar::region::RegionBoundary;
use deodar::source::load_raw_records;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Normalize a raw POI dump into a canonical dataset")]
struct Args {
    /// Raw POI file (.geojson, .json, .gz or .osm.pbf)
    #[arg(short, long)]
    raw: PathBuf,

    /// Region boundary GeoJSON
    #[arg(short, long)]
    boundary: PathBuf,

    /// Where to write the canonical dataset JSON
    #[arg(short, long)]
    output: PathBuf,

    /// Optional TOML config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override ingest.dedup_radius_meters
    #[arg(long)]
    dedup_radius: Option<f64>,
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Deodar Ingest Pipeline");
    info!("Raw file: {}", args.raw.display());
    info!("Boundary: {}", args.boundary.display());

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let dedup_radius = args.dedup_radius.unwrap_or(config.ingest.dedup_radius_meters);

    let started = Utc::now();

    let pb = spinner("Loading region boundary")?;
    let region = RegionBoundary::load_from_file(&args.boundary)
        .with_context(|| format!("Failed to load boundary {}", args.boundary.display()))?;
    pb.finish_and_clear();
    let bbox = region.bbox();
    info!(
        "Region: {} polygons, bbox [{:.4}, {:.4}, {:.4}, {:.4}]",
        region.polygon_count(),
        bbox.min_lon,
        bbox.min_lat,
        bbox.max_lon,
        bbox.max_lat
    );

    let pb = spinner("Reading raw records")?;
    let records = load_raw_records(&args.raw)
        .with_context(|| format!("Failed to read raw records from {}", args.raw.display()))?;
    pb.finish_and_clear();

    let pb = spinner("Normalizing")?;
    let dataset = Normalizer::new(&region)
        .with_dedup_radius(dedup_radius)
        .run(&records)
        .context("Normalization failed")?;
    pb.finish_and_clear();

    let json = dataset.to_json().context("Failed to serialize dataset")?;
    fs::write(&args.output, &json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let report = &dataset.report;
    info!("Ingestion complete in {}s", (Utc::now() - started).num_seconds());
    info!("  Raw records:       {}", report.total_raw);
    info!("  Kept:              {}", report.total_kept);
    info!("  Duplicates:        {}", report.duplicates_dropped);
    info!("  Invalid:           {}", report.invalid_dropped);
    info!("  Out of region:     {}", report.out_of_region_dropped);
    for group in CategoryGroup::all() {
        info!("  {:<18} {}", format!("{}:", group), report.category_counts.get(group).copied().unwrap_or(0));
    }
    if report.total_kept == 0 {
        warn!("No POIs survived normalization; the dataset is empty");
    }
    info!(
        "Wrote {} ({:016x})",
        args.output.display(),
        dataset.fingerprint().context("Failed to fingerprint dataset")?
    );

    Ok(())
}
