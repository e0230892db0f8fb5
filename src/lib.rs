//! Geopop - population-within-radius estimation over geohash cells
//!
//! Ingestion buckets place populations into fixed-precision geohash cells;
//! queries resolve a place name, cover the query circle with cells and sum
//! the distinct population values found in them.

pub mod aggregate;
pub mod cell;
pub mod config;
pub mod cover;
pub mod error;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod service;
pub mod source;
pub mod store;

pub use aggregate::AggregationEngine;
pub use config::{Config, IndexConfig, IngestConfig};
pub use error::PopulationError;
pub use indexer::GeohashIndexer;
pub use models::{GeoPoint, PlaceRecord};
pub use pipeline::{IngestPipeline, IngestStats};
pub use resolver::PlaceResolver;
pub use service::{PopulationEstimate, PopulationService};
pub use store::{MemoryStore, PopulationStore, SledStore, StoreError};
