//! GeoNames `cities500.txt` reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One row of a GeoNames dump (tab separated, no header, 19 columns).
///
/// Coordinates and population use lenient parsing: blank or malformed
/// values become `None` and are dropped by the filter.
#[derive(Debug, Clone, Deserialize)]
pub struct GeonamesRow {
    pub geonameid: u64,
    pub name: String,
    pub asciiname: String,
    /// Comma-joined alternate names
    pub alternatenames: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    pub feature_class: String,
    pub feature_code: String,
    pub country_code: String,
    pub cc2: String,
    pub admin1_code: String,
    pub admin2_code: String,
    pub admin3_code: String,
    pub admin4_code: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub population: Option<u64>,
    pub elevation: String,
    pub dem: String,
    pub timezone: String,
    pub modification_date: String,
}

/// Streaming reader over a GeoNames dump.
pub struct GeonamesReader<R: Read> {
    reader: csv::Reader<R>,
}

impl GeonamesReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open GeoNames file {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<R: Read> GeonamesReader<R> {
    pub fn new(reader: R) -> Self {
        // Names may contain bare quotes; the dump never quotes fields.
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);
        Self { reader }
    }

    /// Iterate rows; malformed rows are yielded as errors.
    pub fn rows(self) -> impl Iterator<Item = Result<GeonamesRow, csv::Error>> {
        self.reader.into_deserialize()
    }
}
