//! Proximity cover: which cells does a query circle touch?
//!
//! The circle is sampled on a grid anchored at the query center, stepping
//! half a cell in each axis. Every sample within the radius (great-circle
//! distance) contributes the cell it falls in. Cells only partly inside
//! the circle are included whole, so the cover over-approximates near
//! the boundary.

use std::collections::BTreeSet;

use geo::{Distance, Haversine};
use geohash::GeohashError;
use tracing::debug;

use crate::cell::{encode_cell, CellSize};
use crate::models::GeoPoint;

/// Mean earth radius used to size the sampling grid.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Cells whose union approximately covers the circle of `radius_m` metres
/// around `center`.
///
/// The cell containing `center` is always part of the result, so a zero or
/// negative radius yields exactly that one cell. Samples beyond a pole are
/// dropped and longitudes wrap across the antimeridian.
///
/// Growing the radius never removes a cell: the sample grid only depends
/// on the center and precision, and the distance filter is `<= radius_m`.
pub fn cover(
    center: GeoPoint,
    radius_m: f64,
    precision: usize,
) -> Result<BTreeSet<String>, GeohashError> {
    let mut cells = BTreeSet::new();
    cells.insert(encode_cell(center, precision)?);

    if radius_m.is_nan() || radius_m <= 0.0 {
        return Ok(cells);
    }

    let size = CellSize::at_precision(precision);
    let step_lat = size.lat_deg / 2.0;
    let step_lon = size.lon_deg / 2.0;
    let (lat_moves, lon_moves) = grid_moves(radius_m, precision, center.lat);

    let origin = center.to_point();
    let mut sampled = 0usize;

    for i in -lat_moves..=lat_moves {
        let lat = center.lat + i as f64 * step_lat;
        if !(-90.0..=90.0).contains(&lat) {
            continue;
        }
        for j in -lon_moves..=lon_moves {
            let candidate = GeoPoint::new(lat, wrap_longitude(center.lon + j as f64 * step_lon));
            sampled += 1;
            if Haversine.distance(origin, candidate.to_point()) > radius_m {
                continue;
            }
            if let Ok(cell) = encode_cell(candidate, precision) {
                cells.insert(cell);
            }
        }
    }

    debug!(
        "Cover at ({}, {}) r={}m p={}: {} samples -> {} cells",
        center.lat,
        center.lon,
        radius_m,
        precision,
        sampled,
        cells.len()
    );

    Ok(cells)
}

/// Upper bound on the samples a cover of `radius_m` may take at
/// `precision`, for any center. Close to a pole the grid spans every
/// longitude, so the bound is taken there.
pub fn worst_case_samples(radius_m: f64, precision: usize) -> u64 {
    if radius_m.is_nan() || radius_m <= 0.0 {
        return 1;
    }
    let (lat_moves, lon_moves) = grid_moves(radius_m, precision, 90.0);
    (2 * lat_moves as u64 + 1).saturating_mul(2 * lon_moves as u64 + 1)
}

/// Half-extents of the sampling grid, in steps of half a cell. One extra
/// step on each side absorbs the difference between this radius and the
/// haversine one.
fn grid_moves(radius_m: f64, precision: usize, center_lat: f64) -> (i64, i64) {
    let size = CellSize::at_precision(precision);
    let step_lat = size.lat_deg / 2.0;
    let step_lon = size.lon_deg / 2.0;

    let radius_lat_deg = (radius_m / EARTH_RADIUS_M).to_degrees();
    let cos_lat = center_lat.to_radians().cos().max(f64::EPSILON);
    let radius_lon_deg = (radius_lat_deg / cos_lat).min(180.0);
    let lat_moves = (radius_lat_deg / step_lat).ceil() as i64 + 1;
    let lon_moves = (radius_lon_deg / step_lon).ceil() as i64 + 1;
    (lat_moves, lon_moves)
}

/// Map any longitude into [-180, 180).
fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
