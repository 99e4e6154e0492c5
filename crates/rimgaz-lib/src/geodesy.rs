//! Great-circle distance and point-in-polygon containment.
//!
//! All inputs are decimal degrees. Nothing here validates ranges: callers
//! guarantee latitudes in `[-90, 90]` and longitudes in `[-180, 180]`, and
//! out-of-range input produces a defined (if meaningless) result rather than
//! an error.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Added to the ray-cast edge denominator so vertical edges never divide by zero.
pub const RAY_CAST_EPSILON: f64 = 1e-12;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine distance in metres between two points.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Distance in metres between two [`LatLon`] points.
pub fn distance_between(a: LatLon, b: LatLon) -> f64 {
    distance_meters(a.lat, a.lon, b.lat, b.lon)
}

/// Ray-casting containment test.
///
/// The polygon is closed implicitly (last vertex joins the first). For every
/// edge straddling the query longitude the crossing latitude is computed and
/// the point toggles between inside and outside when it lies below that
/// crossing. Fewer than three vertices is never inside.
pub fn point_in_polygon(lat: f64, lon: f64, vertices: &[LatLon]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        if (a.lon > lon) != (b.lon > lon) {
            let intersect_lat =
                (b.lat - a.lat) * (lon - a.lon) / (b.lon - a.lon + RAY_CAST_EPSILON) + a.lat;
            if lat < intersect_lat {
                inside = !inside;
            }
        }
    }
    inside
}
