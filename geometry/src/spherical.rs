//! Great-circle math on a spherical Earth.
//!
//! All inputs are EPSG:4326 degrees; distances are meters, areas square
//! meters, headings degrees clockwise from north.

use std::f64::consts::{FRAC_PI_2, PI};

use nics_shared::Coordinate;

/// Mean Earth radius used by every spherical routine in this module.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

fn hav(x: f64) -> f64 {
    let s = (x * 0.5).sin();
    s * s
}

fn arc_hav(x: f64) -> f64 {
    2.0 * x.sqrt().asin()
}

/// Great-circle distance between two points, in meters.
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (a.lon - b.lon).to_radians();
    let h = hav(lat1 - lat2) + hav(dlon) * lat1.cos() * lat2.cos();
    arc_hav(h.clamp(0.0, 1.0)) * EARTH_RADIUS_M
}

/// Length of an open path: the sum of its segment lengths.
pub fn distance(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance_between(w[0], w[1])).sum()
}

/// Perimeter of a ring, counting the closing segment whether or not the
/// ring repeats its first point.
pub fn perimeter(points: &[Coordinate]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 2 && first != last => {
            distance(points) + distance_between(*last, *first)
        }
        _ => distance(points),
    }
}

/// Signed spherical-excess area of a ring. Counter-clockwise rings are
/// positive. The ring may or may not repeat its first point.
pub fn signed_area(points: &[Coordinate]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let Some(prev) = points.last() else {
        return 0.0;
    };
    let mut prev_tan_lat = ((FRAC_PI_2 - prev.lat.to_radians()) / 2.0).tan();
    let mut prev_lon = prev.lon.to_radians();
    let mut total = 0.0;
    for point in points {
        let tan_lat = ((FRAC_PI_2 - point.lat.to_radians()) / 2.0).tan();
        let lon = point.lon.to_radians();
        total += polar_triangle_area(tan_lat, lon, prev_tan_lat, prev_lon);
        prev_tan_lat = tan_lat;
        prev_lon = lon;
    }
    total * EARTH_RADIUS_M * EARTH_RADIUS_M
}

/// Area of a ring in square meters; zero below three points.
pub fn area(points: &[Coordinate]) -> f64 {
    signed_area(points).abs()
}

/// Signed area of the triangle (pole, p1, p2) on the unit sphere, with the
/// latitudes given as tan((π/2 - lat) / 2).
fn polar_triangle_area(tan1: f64, lon1: f64, tan2: f64, lon2: f64) -> f64 {
    let dlon = lon1 - lon2;
    let t = tan1 * tan2;
    2.0 * (t * dlon.sin()).atan2(1.0 + t * dlon.cos())
}

/// Center of the bounding box of the points. Used for label placement; this
/// is not the centroid.
pub fn midpoint(points: &[Coordinate]) -> Option<Coordinate> {
    let first = points.first()?;
    let (mut min_lat, mut max_lat, mut min_lon, mut max_lon) =
        (first.lat, first.lat, first.lon, first.lon);
    for p in &points[1..] {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lon = min_lon.min(p.lon);
        max_lon = max_lon.max(p.lon);
    }
    Some(Coordinate::new(
        (min_lat + max_lat) / 2.0,
        (min_lon + max_lon) / 2.0,
    ))
}

/// Initial bearing from `from` to `to`, in [0, 360).
pub fn heading(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_heading(y.atan2(x).to_degrees())
}

pub(crate) fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Point reached by travelling `distance_m` from `from` on initial bearing
/// `heading_deg`.
pub fn offset(from: Coordinate, distance_m: f64, heading_deg: f64) -> Coordinate {
    let angular = distance_m / EARTH_RADIUS_M;
    let heading = heading_deg.to_radians();
    let lat = from.lat.to_radians();
    let lon = from.lon.to_radians();

    let (sin_d, cos_d) = angular.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let sin_lat2 = cos_d * sin_lat + sin_d * cos_lat * heading.cos();
    let dlon = (sin_d * cos_lat * heading.sin()).atan2(cos_d - sin_lat * sin_lat2);

    Coordinate::new(
        sin_lat2.clamp(-1.0, 1.0).asin().to_degrees(),
        wrap_longitude((lon + dlon).to_degrees()),
    )
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Longest possible great-circle distance.
pub const MAX_DISTANCE_M: f64 = PI * EARTH_RADIUS_M;
