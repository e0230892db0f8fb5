//! Error kinds surfaced by the population core.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by resolver, indexer, cover and aggregation operations.
#[derive(Debug, Error)]
pub enum PopulationError {
    /// Place name has no resolver entry
    #[error("Location not found in database: {0}")]
    NotFound(String),

    /// Radius above the ceiling or malformed query parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key-value backend unreachable or returned unusable data
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// A single ingestion row could not be encoded or written
    #[error("Record skipped: {0}")]
    RecordSkipped(String),
}

pub type Result<T> = std::result::Result<T, PopulationError>;
