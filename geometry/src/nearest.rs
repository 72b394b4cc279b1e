use nics_shared::Coordinate;

use crate::spherical;

/// Closest point on a path to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub point: Coordinate,
    /// Index of the segment's start vertex.
    pub segment: usize,
    /// Great-circle distance from the query, in meters.
    pub distance_m: f64,
}

/// Project `query` onto every segment of `vertices` and keep the closest hit.
/// With `closed`, the segment from the last vertex back to the first is
/// searched too. Projection is planar in degree space, which is fine for
/// the tens-of-vertices shapes this is used on.
pub fn find_nearest_point(
    query: Coordinate,
    vertices: &[Coordinate],
    closed: bool,
) -> Option<NearestPoint> {
    match vertices {
        [] => None,
        [only] => Some(NearestPoint {
            point: *only,
            segment: 0,
            distance_m: spherical::distance_between(query, *only),
        }),
        _ => {
            let n = vertices.len();
            let segments = if closed && vertices[0] != vertices[n - 1] { n } else { n - 1 };
            (0..segments)
                .map(|i| {
                    let point = nearest_on_segment(query, vertices[i], vertices[(i + 1) % n]);
                    NearestPoint {
                        point,
                        segment: i,
                        distance_m: spherical::distance_between(query, point),
                    }
                })
                .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
        }
    }
}

/// Parametric projection of `query` onto segment `start`-`end`, clamped to
/// the segment.
pub fn nearest_on_segment(query: Coordinate, start: Coordinate, end: Coordinate) -> Coordinate {
    if start == end {
        return start;
    }
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let u = ((query.lon - start.lon) * dx + (query.lat - start.lat) * dy) / (dx * dx + dy * dy);
    if u <= 0.0 {
        start
    } else if u >= 1.0 {
        end
    } else {
        Coordinate::new(start.lat + u * dy, start.lon + u * dx)
    }
}
