//! Typed ingestion record handed to the core.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// A populated place ready for ingestion.
///
/// Records only reach the core once the source filter has guaranteed a
/// coordinate and a population value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub ascii_name: String,
    pub alternate_names: Vec<String>,
    pub point: GeoPoint,
    /// Feature classification tag (GeoNames feature code, e.g. `PPLC`)
    pub feature_code: String,
    pub population: u64,
}

impl PlaceRecord {
    /// All name variants this record registers under, in write order.
    pub fn name_variants(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(std::iter::once(self.ascii_name.as_str()))
            .chain(self.alternate_names.iter().map(String::as_str))
    }
}

/// Split a comma-joined alternate name list, dropping empty entries.
pub fn split_alternate_names(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
