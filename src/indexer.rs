//! Ingest-time bucketing of population values into geohash cells.

use std::sync::Arc;

use tracing::warn;

use crate::cell::{encode_cell, expand};
use crate::config::IndexConfig;
use crate::error::{PopulationError, Result};
use crate::models::GeoPoint;
use crate::store::PopulationStore;

/// Writes population values into the cell sets of the store.
///
/// Broad features (large populated places) are written to their own cell
/// and to every neighboring cell; everything else only to its own cell.
/// Cell sets only ever grow: re-indexing a place with an updated
/// population adds the new value next to the old one.
#[derive(Clone)]
pub struct GeohashIndexer {
    store: Arc<dyn PopulationStore>,
    config: IndexConfig,
}

impl GeohashIndexer {
    pub fn new(store: Arc<dyn PopulationStore>, config: IndexConfig) -> Self {
        Self { store, config }
    }

    pub fn precision(&self) -> usize {
        self.config.precision
    }

    /// Cells a feature at `point` contributes to.
    pub fn target_cells(&self, point: GeoPoint, feature_code: &str) -> Result<Vec<String>> {
        let cell = encode_cell(point, self.config.precision).map_err(|e| {
            PopulationError::RecordSkipped(format!(
                "cannot encode ({}, {}): {}",
                point.lat, point.lon, e
            ))
        })?;

        if self.config.is_broad(feature_code) {
            Ok(expand(&cell))
        } else {
            Ok(vec![cell])
        }
    }

    /// Add `population` to every target cell. Returns the cells written.
    ///
    /// A failing cell write does not stop the remaining cells; the record is
    /// reported as skipped only when no cell could be written.
    pub fn index(&self, point: GeoPoint, population: u64, feature_code: &str) -> Result<Vec<String>> {
        let member = population.to_string();
        let mut written = Vec::new();
        let mut last_error = None;

        for cell in self.target_cells(point, feature_code)? {
            match self.store.add_to_set(&cell, &member) {
                Ok(_) => written.push(cell),
                Err(e) => {
                    warn!("Failed to add {} to cell {}: {}", member, cell, e);
                    last_error = Some(e);
                }
            }
        }

        match (written.is_empty(), last_error) {
            (true, Some(e)) => Err(PopulationError::RecordSkipped(e.to_string())),
            _ => Ok(written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const PARIS: GeoPoint = GeoPoint {
        lat: 48.8566,
        lon: 2.3522,
    };

    fn indexer() -> (Arc<MemoryStore>, GeohashIndexer) {
        let store = Arc::new(MemoryStore::new());
        let indexer = GeohashIndexer::new(store.clone(), IndexConfig::default());
        (store, indexer)
    }

    #[test]
    fn test_capital_expands_to_neighbors() {
        let (store, indexer) = indexer();
        let cells = indexer.index(PARIS, 2_000_000, "PPLC").unwrap();

        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], "u09t");
        for cell in &cells {
            assert!(store.set_members(cell).unwrap().contains("2000000"));
        }
        assert_eq!(store.set_count(), 9);
    }

    #[test]
    fn test_point_like_feature_stays_in_cell() {
        let (store, indexer) = indexer();
        let cells = indexer.index(PARIS, 1_419, "PPLA3").unwrap();
        assert_eq!(cells, vec!["u09t".to_string()]);
        assert_eq!(store.set_count(), 1);
    }

    #[test]
    fn test_reindex_same_value_is_noop() {
        let (store, indexer) = indexer();
        indexer.index(PARIS, 500, "PPLA4").unwrap();
        indexer.index(PARIS, 500, "PPLA4").unwrap();
        assert_eq!(store.set_members("u09t").unwrap().len(), 1);
    }

    #[test]
    fn test_reindex_new_value_accumulates() {
        let (store, indexer) = indexer();
        indexer.index(PARIS, 500, "PPLA4").unwrap();
        indexer.index(PARIS, 510, "PPLA4").unwrap();
        assert_eq!(store.set_members("u09t").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_coordinate_is_skipped() {
        let (store, indexer) = indexer();
        let result = indexer.index(GeoPoint::new(123.0, 0.0), 10, "PPL");
        assert!(matches!(result, Err(PopulationError::RecordSkipped(_))));
        assert_eq!(store.set_count(), 0);
    }

    #[test]
    fn test_polar_capital_stays_near_pole() {
        let (store, indexer) = indexer();
        let cells = indexer.index(GeoPoint::new(89.99, 10.0), 1_000, "PPL").unwrap();

        assert_eq!(cells.len(), 6);
        assert_eq!(store.set_count(), 6);
        for cell in &cells {
            assert!(crate::cell::cell_center(cell).unwrap().lat > 89.0);
        }
    }

    #[test]
    fn test_custom_broad_set() {
        let store = Arc::new(MemoryStore::new());
        let mut config = IndexConfig::default();
        config.broad_feature_classes.clear();
        config.broad_feature_classes.insert("PPLA2".to_string());
        let indexer = GeohashIndexer::new(store, config);

        assert_eq!(indexer.target_cells(PARIS, "PPLC").unwrap().len(), 1);
        assert_eq!(indexer.target_cells(PARIS, "PPLA2").unwrap().len(), 9);
    }
}
