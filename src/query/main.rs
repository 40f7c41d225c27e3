//! Query CLI over a canonical dataset.
//!
//! Loads the dataset written by `ingest`, publishes it into a [`Geocoder`]
//! and prints the answer to one query as JSON on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deodar::config::Config;
use deodar::engine::{to_feature_collection, Geocoder};
use deodar::models::{CanonicalDataset, CategoryGroup};
use deodar::source::read_to_string_maybe_gz;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Query a canonical POI dataset")]
struct Args {
    /// Canonical dataset JSON written by `ingest`
    #[arg(short, long)]
    dataset: PathBuf,

    /// Optional TOML config
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Substring search on POI names
    Search {
        query: String,
    },
    /// Nearest POI to a point
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Proximity buffers around every POI of one category, as GeoJSON
    Buffers {
        /// Category group, e.g. health or education
        category: CategoryGroup,
        /// Buffer radius in meters
        #[arg(long, default_value = "500")]
        radius: f64,
    },
    /// Counters from the ingestion run
    Report,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let content = read_to_string_maybe_gz(&args.dataset)
        .with_context(|| format!("Failed to read dataset {}", args.dataset.display()))?;
    let dataset = CanonicalDataset::from_json(&content).context("Failed to parse dataset")?;
    info!("Loaded {} POIs from {}", dataset.pois.len(), args.dataset.display());

    let geocoder = Geocoder::new(&config);
    geocoder.build_and_publish(dataset);

    match args.command {
        Command::Search { query } => print_json(&geocoder.search(&query)?)?,
        Command::Reverse { lat, lon } => print_json(&geocoder.reverse(lat, lon)?)?,
        Command::Buffers { category, radius } => {
            let buffers = geocoder.buffers(category, radius)?;
            print_json(&to_feature_collection(&buffers))?
        }
        Command::Report => print_json(&geocoder.ingestion_report()?)?,
    }

    Ok(())
}
