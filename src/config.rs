//! Runtime configuration for indexing and querying.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Geohash length used on both the ingest and query path.
pub const DEFAULT_PRECISION: usize = 4;

/// Queries above this radius are rejected.
pub const DEFAULT_MAX_RADIUS_KM: u32 = 500;

/// Most samples a single cover may take. Configs whose worst-case query
/// would exceed this are rejected at load time.
pub const MAX_COVER_SAMPLES: u64 = 2_000_000;

/// Feature codes whose population is spread over the neighboring cells too.
pub const DEFAULT_BROAD_FEATURE_CLASSES: &[&str] = &["PPL", "PPLA", "PPLC"];

/// Countries ingested when none are given on the command line.
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "US", "MX", "FR", "CN", "IT", "DE", "ID", "ES", "RO", "GB", "RU", "AU", "PH", "PL", "IN",
    "AT", "UA", "CZ", "BE", "TR",
];

/// Feature codes accepted by the ingestion filter.
pub const DEFAULT_FEATURE_CODES: &[&str] = &["PPL", "PPLC", "PPLA", "PPLA2", "PPLA3", "PPLA4", "PPLA5"];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub ingest: IngestConfig,
}

/// Settings shared by the indexer, cover generator and query endpoint.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    pub precision: usize,
    pub broad_feature_classes: BTreeSet<String>,
    pub max_radius_km: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            broad_feature_classes: to_set(DEFAULT_BROAD_FEATURE_CLASSES),
            max_radius_km: DEFAULT_MAX_RADIUS_KM,
        }
    }
}

impl IndexConfig {
    pub fn is_broad(&self, feature_code: &str) -> bool {
        self.broad_feature_classes.contains(feature_code)
    }

    /// Samples a cover at the maximum radius takes in the worst case.
    pub fn worst_case_cover_samples(&self) -> u64 {
        crate::cover::worst_case_samples(f64::from(self.max_radius_km) * 1000.0, self.precision)
    }
}

/// Record filter settings for the ingest binary.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub countries: BTreeSet<String>,
    pub feature_codes: BTreeSet<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            countries: to_set(DEFAULT_COUNTRIES),
            feature_codes: to_set(DEFAULT_FEATURE_CODES),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or fall back to defaults when no path is set.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        // geohash encodes lengths 1..=12
        if !(1..=12).contains(&self.index.precision) {
            anyhow::bail!(
                "index.precision must be between 1 and 12, got {}",
                self.index.precision
            );
        }

        let samples = self.index.worst_case_cover_samples();
        if samples > MAX_COVER_SAMPLES {
            anyhow::bail!(
                "index.precision {} with index.max_radius_km {} needs up to {} cover samples per query (limit {}); lower one of them",
                self.index.precision,
                self.index.max_radius_km,
                samples,
                MAX_COVER_SAMPLES
            );
        }
        Ok(())
    }
}

fn to_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}
