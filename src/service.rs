//! Query orchestration: name -> coordinate -> cover -> total.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregationEngine;
use crate::config::IndexConfig;
use crate::cover::cover;
use crate::error::{PopulationError, Result};
use crate::resolver::PlaceResolver;
use crate::store::{PopulationStore, StoreError};

/// Result of a population query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationEstimate {
    pub population: u64,
}

/// Read-only query side. Cheap to clone and safe to share across requests.
#[derive(Clone)]
pub struct PopulationService {
    store: Arc<dyn PopulationStore>,
    resolver: PlaceResolver,
    engine: AggregationEngine,
    config: IndexConfig,
}

impl PopulationService {
    pub fn new(store: Arc<dyn PopulationStore>, config: IndexConfig) -> Self {
        Self {
            resolver: PlaceResolver::new(store.clone()),
            engine: AggregationEngine::new(store.clone()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Population within `radius_km` of the named place.
    ///
    /// A radius above the configured ceiling is rejected before touching the
    /// store. A negative radius is treated as zero (the place's own cell).
    pub fn estimate(&self, place: &str, radius_km: i64) -> Result<PopulationEstimate> {
        if place.trim().is_empty() {
            return Err(PopulationError::InvalidInput(
                "place must not be empty".to_string(),
            ));
        }
        if radius_km > i64::from(self.config.max_radius_km) {
            return Err(PopulationError::InvalidInput(format!(
                "Radius greater than allowed threshold ({} km)",
                self.config.max_radius_km
            )));
        }

        let center = self.resolver.resolve(place)?;
        let radius_m = radius_km.max(0) as f64 * 1000.0;

        let cells = cover(center, radius_m, self.config.precision).map_err(|e| {
            StoreError::Corrupt {
                key: crate::models::place_key(place),
                reason: e.to_string(),
            }
        })?;

        debug!(
            "Query '{}' r={}km covers {} cells",
            place,
            radius_km,
            cells.len()
        );

        let population = self.engine.aggregate(&cells)?;
        Ok(PopulationEstimate { population })
    }

    /// Whether the backing store answers.
    pub fn health_check(&self) -> bool {
        self.store.ping().is_ok()
    }
}
