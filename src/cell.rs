//! Fixed-precision geohash cells.
//!
//! Thin layer over the `geohash` crate: encoding a point to its cell,
//! enumerating a cell's neighbors and describing a cell's extent.

use geohash::{Direction, GeohashError};

use crate::models::GeoPoint;

/// Approximate metres per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::N,
    Direction::NE,
    Direction::E,
    Direction::SE,
    Direction::S,
    Direction::SW,
    Direction::W,
    Direction::NW,
];

/// Encode a point to the geohash cell containing it.
pub fn encode_cell(point: GeoPoint, precision: usize) -> Result<String, GeohashError> {
    geohash::encode(point.to_coord(), precision)
}

/// Center of a cell
pub fn cell_center(cell: &str) -> Result<GeoPoint, GeohashError> {
    let (coord, _, _) = geohash::decode(cell)?;
    Ok(GeoPoint::from(coord))
}

/// Neighbors of `cell` in all eight directions.
///
/// Neighbors across the antimeridian wrap to the other side. The geohash
/// grid also wraps north of the top row to the south pole (and back), so
/// any neighbor whose center is more than one cell height away in
/// latitude is dropped. Cells touching a pole therefore have five
/// neighbors.
pub fn neighbors(cell: &str) -> Vec<String> {
    let Ok(center) = cell_center(cell) else {
        return Vec::new();
    };
    let max_lat_step = CellSize::at_precision(cell.len()).lat_deg * 1.5;

    ALL_DIRECTIONS
        .into_iter()
        .filter_map(|dir| geohash::neighbor(cell, dir).ok())
        .filter(|n| n != cell)
        .filter(|n| match cell_center(n) {
            Ok(c) => (c.lat - center.lat).abs() <= max_lat_step,
            Err(_) => false,
        })
        .collect()
}

/// The cell itself followed by its neighbors.
pub fn expand(cell: &str) -> Vec<String> {
    let mut cells = Vec::with_capacity(9);
    cells.push(cell.to_string());
    for n in neighbors(cell) {
        if !cells.contains(&n) {
            cells.push(n);
        }
    }
    cells
}

/// Extent of a geohash cell at a given precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl CellSize {
    /// Geohash interleaves bits starting with longitude, so longitude gets
    /// the extra bit on odd totals.
    pub fn at_precision(precision: usize) -> Self {
        let bits = 5 * precision as i32;
        let lon_bits = (bits + 1) / 2;
        let lat_bits = bits / 2;
        Self {
            lat_deg: 180.0 / 2f64.powi(lat_bits),
            lon_deg: 360.0 / 2f64.powi(lon_bits),
        }
    }

    /// North-south extent in metres
    pub fn height_m(&self) -> f64 {
        self.lat_deg * METERS_PER_DEGREE
    }

    /// East-west extent in metres at the equator
    pub fn width_m(&self) -> f64 {
        self.lon_deg * METERS_PER_DEGREE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_paris() {
        let cell = encode_cell(GeoPoint::new(48.8566, 2.3522), 4).unwrap();
        assert_eq!(cell, "u09t");
    }

    #[test]
    fn test_encode_decode_reencode_is_stable() {
        let points = [
            GeoPoint::new(48.8566, 2.3522),
            GeoPoint::new(-33.8688, 151.2093),
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(-89.9, 179.9),
        ];
        for p in points {
            for precision in 1..=8 {
                let cell = encode_cell(p, precision).unwrap();
                let center = cell_center(&cell).unwrap();
                assert_eq!(encode_cell(center, precision).unwrap(), cell);
            }
        }
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(encode_cell(GeoPoint::new(91.0, 0.0), 4).is_err());
        assert!(encode_cell(GeoPoint::new(0.0, -181.0), 4).is_err());
    }

    #[test]
    fn test_interior_cell_has_eight_neighbors() {
        let n = neighbors("u09t");
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&"u09t".to_string()));

        let expanded = expand("u09t");
        assert_eq!(expanded.len(), 9);
        assert_eq!(expanded[0], "u09t");
    }

    #[test]
    fn test_polar_cell_has_fewer_neighbors() {
        let cell = encode_cell(GeoPoint::new(89.99, 10.0), 4).unwrap();
        let n = neighbors(&cell);
        assert_eq!(n.len(), 5, "got {:?}", n);
        for neighbor in &n {
            let c = cell_center(neighbor).unwrap();
            assert!(c.lat > 89.0, "{} is at {:?}", neighbor, c);
        }

        let cell = encode_cell(GeoPoint::new(-89.99, -120.0), 4).unwrap();
        let n = neighbors(&cell);
        assert_eq!(n.len(), 5, "got {:?}", n);
        for neighbor in &n {
            assert!(cell_center(neighbor).unwrap().lat < -89.0);
        }
    }

    #[test]
    fn test_antimeridian_neighbors_wrap() {
        let cell = encode_cell(GeoPoint::new(10.0, 179.99), 4).unwrap();
        let n = neighbors(&cell);
        assert_eq!(n.len(), 8, "got {:?}", n);

        let wrapped = n
            .iter()
            .filter(|neighbor| cell_center(neighbor).unwrap().lon < -179.0)
            .count();
        assert_eq!(wrapped, 3);
        for neighbor in &n {
            assert!((cell_center(neighbor).unwrap().lat - 10.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_cell_size_precision_4() {
        let size = CellSize::at_precision(4);
        assert!((size.lat_deg - 0.17578125).abs() < 1e-12);
        assert!((size.lon_deg - 0.3515625).abs() < 1e-12);
        // ~39 km x ~19.5 km
        assert!((size.width_m() - 39_135.0).abs() < 200.0);
        assert!((size.height_m() - 19_568.0).abs() < 200.0);
    }
}
