//! Record source for ingestion: GeoNames dump parsing and row filtering.
//!
//! Nothing here touches the store; the output is a stream of typed
//! [`PlaceRecord`](crate::models::PlaceRecord)s for the ingest pipeline.

mod filter;
mod geonames;

pub use filter::{FilterStats, RecordFilter};
pub use geonames::{GeonamesReader, GeonamesRow};
