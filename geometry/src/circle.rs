//! Circle markup support: circles are stored as center + radius and only
//! turned into a ring for rendering or WKT output.

use geo::{Distance, Geodesic, Point};
use nics_shared::Coordinate;

use crate::spherical;

pub const DEFAULT_CIRCLE_SEGMENTS: usize = 40;

/// Largest great-circle distance from the bounding-box midpoint to any
/// point. An approximation of the minimum enclosing circle.
pub fn smallest_enclosing_radius(points: &[Coordinate]) -> f64 {
    let Some(center) = spherical::midpoint(points) else {
        return 0.0;
    };
    points
        .iter()
        .map(|p| spherical::distance_between(center, *p))
        .fold(0.0, f64::max)
}

/// Sample `segments` evenly spaced bearings around `center` and close the
/// ring, giving `segments + 1` points.
pub fn circle_to_polygon(center: Coordinate, radius_m: f64, segments: usize) -> Vec<Coordinate> {
    let segments = segments.max(3);
    let step = 360.0 / segments as f64;
    let mut ring: Vec<Coordinate> = (0..segments)
        .map(|i| spherical::offset(center, radius_m, i as f64 * step))
        .collect();
    ring.push(ring[0]);
    ring
}

/// Ellipsoidal (WGS84 geodesic) distance between a circle's center and a
/// point on its edge. Deliberately not the spherical distance.
pub fn radius_from_two_points(center: Coordinate, edge: Coordinate) -> f64 {
    Geodesic.distance(
        Point::new(center.lon, center.lat),
        Point::new(edge.lon, edge.lat),
    )
}
