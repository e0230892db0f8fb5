//! Core data models shared by the ingest and query binaries.

pub mod place;
pub mod record;

pub use place::{place_key, GeoPoint, PLACE_KEY_PREFIX};
pub use record::{split_alternate_names, PlaceRecord};
