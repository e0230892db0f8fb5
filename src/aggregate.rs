//! Summing the population held by a set of cells.

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::debug;

use crate::error::Result;
use crate::store::{PopulationStore, StoreError};

/// Sums the distinct population values found across a set of cells.
///
/// Values are deduplicated across cells *by value*: a capital written into
/// nine neighboring cells counts once, but so do two unrelated places that
/// happen to share the same population figure.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn PopulationStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn PopulationStore>) -> Self {
        Self { store }
    }

    /// Total population of the union of the cells' sets. Missing cells
    /// contribute nothing; the order and repetition of `cells` do not matter.
    pub fn aggregate<I, S>(&self, cells: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = cells.into_iter().map(|c| c.as_ref().to_string()).collect();
        let union = self.store.union_sets(&keys)?;

        // Dedup on the parsed value so "500" and "500.0" count once
        let mut values: HashSet<u64> = HashSet::with_capacity(union.len());
        for member in &union {
            let value = parse_population(member).ok_or_else(|| StoreError::Corrupt {
                key: member.clone(),
                reason: "population member is not an integer".to_string(),
            })?;
            values.insert(value);
        }
        let total = values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));

        debug!(
            "Aggregated {} cells -> {} distinct values, total {}",
            keys.len(),
            values.len(),
            total
        );
        Ok(total)
    }
}

/// Stored members are decimal strings; values written as floats by older
/// importers (e.g. `"1052.0"`) are truncated to an integer.
fn parse_population(member: &str) -> Option<u64> {
    let member = member.trim();
    if let Ok(v) = member.parse::<u64>() {
        return Some(v);
    }
    member
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}
