//! Place coordinates and their persisted representation.

use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

/// Prefix for place entries in the key-value store.
pub const PLACE_KEY_PREFIX: &str = "pl-";

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the point lies on the globe (lat in [-90, 90], lon in [-180, 180]).
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Stored value: `"<lat>,<lon>"` in plain decimal notation.
    pub fn to_store_value(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    /// Parse a `"<lat>,<lon>"` store value.
    pub fn from_store_value(value: &str) -> Option<Self> {
        let (lat, lon) = value.split_once(',')?;
        let lat = lat.trim().parse().ok()?;
        let lon = lon.trim().parse().ok()?;
        Some(Self { lat, lon })
    }

    /// geo-types coordinate (x = lon, y = lat)
    pub fn to_coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }

    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(c: Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

/// Store key for a place name: `"pl-" + UPPERCASE(name)`.
pub fn place_key(name: &str) -> String {
    format!("{}{}", PLACE_KEY_PREFIX, name.to_uppercase())
}
