//! Place name -> coordinate resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{PopulationError, Result};
use crate::models::{place_key, GeoPoint, PlaceRecord};
use crate::store::{PopulationStore, StoreError};

/// Maps uppercase place names (and their alternate spellings) to a coordinate.
#[derive(Clone)]
pub struct PlaceResolver {
    store: Arc<dyn PopulationStore>,
}

impl PlaceResolver {
    pub fn new(store: Arc<dyn PopulationStore>) -> Self {
        Self { store }
    }

    /// Register `point` under the primary name, the ASCII name and every
    /// alternate name. Empty names are skipped. A failed write is logged and
    /// the remaining variants are still attempted.
    ///
    /// Returns the number of variants written.
    pub fn upsert(
        &self,
        name: &str,
        ascii_name: &str,
        alternate_names: &[String],
        point: GeoPoint,
    ) -> usize {
        let value = point.to_store_value();
        let variants = [name, ascii_name]
            .into_iter()
            .chain(alternate_names.iter().map(String::as_str));

        let mut written = 0;
        for variant in variants {
            let variant = variant.trim();
            if variant.is_empty() {
                continue;
            }
            match self.store.set(&place_key(variant), &value) {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to store place '{}': {}", variant, e),
            }
        }
        written
    }

    /// Convenience wrapper over [`PlaceResolver::upsert`] for a full record.
    pub fn upsert_record(&self, record: &PlaceRecord) -> usize {
        self.upsert(
            &record.name,
            &record.ascii_name,
            &record.alternate_names,
            record.point,
        )
    }

    /// Exact, case-insensitive lookup.
    pub fn resolve(&self, name: &str) -> Result<GeoPoint> {
        let key = place_key(name.trim());
        let value = self
            .store
            .get(&key)?
            .ok_or_else(|| PopulationError::NotFound(name.to_string()))?;

        let point = GeoPoint::from_store_value(&value).ok_or_else(|| StoreError::Corrupt {
            key: key.clone(),
            reason: format!("expected '<lat>,<lon>', got '{}'", value),
        })?;

        debug!("Resolved {} -> ({}, {})", key, point.lat, point.lon);
        Ok(point)
    }
}
