//! Ingestion pipeline: resolver upsert + geohash indexing per record.

use std::ops::Add;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::PopulationError;
use crate::indexer::GeohashIndexer;
use crate::models::PlaceRecord;
use crate::resolver::PlaceResolver;

/// Log a progress line every this many records.
const LOG_EVERY: usize = 1000;

/// Outcome counts for an ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Records fully ingested
    pub ingested: usize,
    /// Records dropped because they could not be encoded or written
    pub skipped: usize,
    /// Name variants written to the resolver
    pub names_written: usize,
    /// Cell insertions performed
    pub cells_written: usize,
}

impl Add for IngestStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            ingested: self.ingested + other.ingested,
            skipped: self.skipped + other.skipped,
            names_written: self.names_written + other.names_written,
            cells_written: self.cells_written + other.cells_written,
        }
    }
}

/// Writes records into the resolver and the cell index.
///
/// Records are independent of each other, so a batch is processed in
/// parallel; a failing record is logged and counted, never fatal.
pub struct IngestPipeline {
    resolver: PlaceResolver,
    indexer: GeohashIndexer,
}

impl IngestPipeline {
    pub fn new(resolver: PlaceResolver, indexer: GeohashIndexer) -> Self {
        Self { resolver, indexer }
    }

    /// Ingest a single record.
    ///
    /// The coordinate is checked before anything is written, so a rejected
    /// record never leaves a name entry behind.
    pub fn ingest_one(&self, record: &PlaceRecord) -> Result<IngestStats, PopulationError> {
        if !record.point.is_valid() {
            return Err(PopulationError::RecordSkipped(format!(
                "coordinate ({}, {}) is off the globe",
                record.point.lat, record.point.lon
            )));
        }

        let names_written = self.resolver.upsert_record(record);
        if names_written == 0 {
            return Err(PopulationError::RecordSkipped(format!(
                "no name variant of '{}' could be stored",
                record.name
            )));
        }

        let cells = self
            .indexer
            .index(record.point, record.population, &record.feature_code)?;

        Ok(IngestStats {
            ingested: 1,
            skipped: 0,
            names_written,
            cells_written: cells.len(),
        })
    }

    /// Ingest a batch, optionally ticking a progress bar per record.
    pub fn ingest(&self, records: &[PlaceRecord], progress: Option<&ProgressBar>) -> IngestStats {
        let processed = AtomicUsize::new(0);
        let stats = records
            .par_iter()
            .map(|record| self.ingest_counted(record, &processed, progress))
            .reduce(IngestStats::default, |a, b| a + b);
        log_summary(&stats);
        stats
    }

    /// Ingest records as they are produced, without collecting them first.
    /// The source iterator is drained on the calling thread and the records
    /// are handed to the rayon pool.
    pub fn ingest_stream<I>(&self, records: I, progress: Option<&ProgressBar>) -> IngestStats
    where
        I: Iterator<Item = PlaceRecord> + Send,
    {
        let processed = AtomicUsize::new(0);
        let stats = records
            .par_bridge()
            .map(|record| self.ingest_counted(&record, &processed, progress))
            .reduce(IngestStats::default, |a, b| a + b);
        log_summary(&stats);
        stats
    }

    fn ingest_counted(
        &self,
        record: &PlaceRecord,
        processed: &AtomicUsize,
        progress: Option<&ProgressBar>,
    ) -> IngestStats {
        let stats = match self.ingest_one(record) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Skipping '{}': {}", record.name, e);
                IngestStats {
                    skipped: 1,
                    ..Default::default()
                }
            }
        };

        let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
        if n % LOG_EVERY == 0 {
            info!("Processed row count: {}", n);
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
        stats
    }
}

fn log_summary(stats: &IngestStats) {
    info!(
        "Ingested {} records ({} skipped, {} names, {} cell insertions)",
        stats.ingested, stats.skipped, stats.names_written, stats.cells_written
    );
}
