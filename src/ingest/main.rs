//! GeoNames ingest pipeline.
//!
//! Reads a GeoNames dump, keeps populated places of the selected countries,
//! registers every name variant and buckets populations into geohash cells.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geopop::source::{FilterStats, GeonamesReader, RecordFilter};
use geopop::{
    Config, GeohashIndexer, IngestPipeline, PlaceRecord, PlaceResolver, PopulationStore, SledStore,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Ingest GeoNames places into the population index")]
struct Args {
    /// Country codes to ingest (defaults to the configured list)
    countries: Vec<String>,

    /// GeoNames dump to import
    #[arg(short, long, default_value = "cities500.txt")]
    file: PathBuf,

    /// Store directory
    #[arg(long, default_value = "geopop.db")]
    db: PathBuf,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ingest every country, ignoring the country list
    #[arg(long, conflicts_with = "countries")]
    all_countries: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    info!("Geopop Ingest Pipeline");
    info!("File: {}", args.file.display());

    let started = Utc::now();

    let store = SledStore::open(&args.db).context("Failed to open store")?;
    store.ping().context("Store is not reachable")?;
    let store = Arc::new(store);

    let filter = build_filter(&args, &config);
    match filter.countries() {
        Some(countries) => info!("Countries: {:?}", countries),
        None => info!("Countries: all"),
    }

    let pipeline = IngestPipeline::new(
        PlaceResolver::new(store.clone()),
        GeohashIndexer::new(store.clone(), config.index.clone()),
    );

    let reader = GeonamesReader::open(&args.file)?;

    // Total is unknown while streaming
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} records ({per_sec})")?,
    );
    pb.enable_steady_tick(Duration::from_millis(200));

    info!("Updating database");
    let mut filter_stats = FilterStats::default();
    let mut unreadable = 0usize;
    let stats = pipeline.ingest_stream(
        filtered_records(reader, &filter, &mut filter_stats, &mut unreadable),
        Some(&pb),
    );
    pb.finish_with_message("Processing complete");

    if unreadable > 0 {
        warn!("Skipped {} unreadable rows", unreadable);
    }
    info!(
        "Selected {} records ({} other country, {} other feature, {} incomplete)",
        filter_stats.accepted,
        filter_stats.wrong_country,
        filter_stats.wrong_feature,
        filter_stats.incomplete
    );

    store.flush().context("Failed to flush store")?;

    let elapsed = (Utc::now() - started).num_seconds();
    info!(
        "Processed {} records in {} seconds ({} skipped)",
        stats.ingested, elapsed, stats.skipped
    );

    Ok(())
}

fn build_filter(args: &Args, config: &Config) -> RecordFilter {
    let countries = if args.all_countries {
        None
    } else if args.countries.is_empty() {
        Some(config.ingest.countries.clone())
    } else {
        Some(args.countries.iter().cloned().collect::<BTreeSet<_>>())
    };
    RecordFilter::from_config(&config.ingest).with_countries(countries)
}

/// Parse and filter the dump lazily into typed records. Unreadable rows
/// are logged and counted in `unreadable`.
fn filtered_records<'a, R>(
    reader: GeonamesReader<R>,
    filter: &'a RecordFilter,
    stats: &'a mut FilterStats,
    unreadable: &'a mut usize,
) -> impl Iterator<Item = PlaceRecord> + Send + 'a
where
    R: Read + Send + 'a,
{
    reader.rows().filter_map(move |row| match row {
        Ok(row) => filter.apply(row, stats),
        Err(e) => {
            *unreadable += 1;
            warn!("Unreadable row: {}", e);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("ingest").chain(extra.iter().copied()))
    }

    #[test]
    fn test_default_countries_from_config() {
        let filter = build_filter(&args(&[]), &Config::default());
        assert_eq!(filter.countries().map(|c| c.len()), Some(20));
    }

    #[test]
    fn test_positional_country_overrides_config() {
        let filter = build_filter(&args(&["fr"]), &Config::default());
        let countries = filter.countries().unwrap();
        assert_eq!(countries.len(), 1);
        assert!(countries.contains("FR"));
    }

    #[test]
    fn test_all_countries() {
        let filter = build_filter(&args(&["--all-countries"]), &Config::default());
        assert!(filter.countries().is_none());
    }

    #[test]
    fn test_filtered_records_skips_unreadable_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "2988507\tParis\tParis\t\t48.85341\t2.3488\tP\tPPLC\tFR\t\t11\t75\t751\t75056\t2138551\t\t42\tEurope/Paris\t2023-10-12"
        )
        .unwrap();
        writeln!(file, "garbage").unwrap();

        let filter = build_filter(&args(&["FR"]), &Config::default());
        let reader = GeonamesReader::open(file.path()).unwrap();
        let mut stats = FilterStats::default();
        let mut unreadable = 0;
        let records: Vec<PlaceRecord> =
            filtered_records(reader, &filter, &mut stats, &mut unreadable).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].feature_code, "PPLC");
        assert_eq!(stats.accepted, 1);
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn test_streamed_dump_lands_in_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "2988507\tParis\tParis\tLutece\t48.85341\t2.3488\tP\tPPLC\tFR\t\t11\t75\t751\t75056\t2138551\t\t42\tEurope/Paris\t2023-10-12"
        )
        .unwrap();
        writeln!(
            file,
            "2950159\tBerlin\tBerlin\t\t52.52437\t13.41053\tP\tPPLC\tDE\t\t16\t00\t11000\t11000000\t3426354\t\t74\tEurope/Berlin\t2023-10-12"
        )
        .unwrap();

        let store = Arc::new(geopop::MemoryStore::new());
        let pipeline = IngestPipeline::new(
            PlaceResolver::new(store.clone()),
            GeohashIndexer::new(store.clone(), Config::default().index),
        );
        let filter = build_filter(&args(&["FR"]), &Config::default());
        let reader = GeonamesReader::open(file.path()).unwrap();
        let mut stats = FilterStats::default();
        let mut unreadable = 0;

        let ingested = pipeline.ingest_stream(
            filtered_records(reader, &filter, &mut stats, &mut unreadable),
            None,
        );

        assert_eq!(ingested.ingested, 1);
        assert_eq!(stats.wrong_country, 1);
        assert!(store.get("pl-LUTECE").unwrap().is_some());
        assert!(store.get("pl-BERLIN").unwrap().is_none());
    }
}
