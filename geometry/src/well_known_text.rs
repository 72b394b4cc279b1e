//! WKT output by markup type and WKT parsing back into coordinate sequences.

use geo_types::{Geometry, LineString};
use nics_shared::{Coordinate, GeometryKind, MarkupType};
use wkt::TryFromWkt;

#[derive(Debug, thiserror::Error)]
pub enum WktError {
    #[error("cannot serialize an empty coordinate list")]
    Empty,
    #[error("malformed WKT: {0}")]
    Parse(String),
    #[error("unsupported geometry type {0} (expected a single POINT, LINESTRING or POLYGON)")]
    Unsupported(&'static str),
}

/// One simple geometry out of a WKT string. Polygon rings are closed.
#[derive(Debug, Clone, PartialEq)]
pub struct WktPart {
    pub kind: GeometryKind,
    pub coordinates: Vec<Coordinate>,
}

/// Append the first coordinate when the ring is not already closed.
pub fn close_ring(coords: &mut Vec<Coordinate>) {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
}

pub fn to_wkt(coords: &[Coordinate], markup: MarkupType) -> Result<String, WktError> {
    to_wkt_kind(coords, markup.geometry_kind())
}

pub fn to_wkt_kind(coords: &[Coordinate], kind: GeometryKind) -> Result<String, WktError> {
    let first = coords.first().ok_or(WktError::Empty)?;
    let wkt = match kind {
        GeometryKind::Point => format!("POINT({})", position(first)),
        GeometryKind::LineString => format!("LINESTRING({})", positions(coords)),
        GeometryKind::Polygon => {
            let mut ring = coords.to_vec();
            close_ring(&mut ring);
            format!("POLYGON(({}))", positions(&ring))
        }
    };
    Ok(wkt)
}

/// `POLYGON` / `MULTIPOLYGON` text for a set of rings grouped per polygon.
pub fn polygons_to_wkt(polygons: &[Vec<Vec<Coordinate>>]) -> Result<String, WktError> {
    let render = |rings: &Vec<Vec<Coordinate>>| {
        let body: Vec<String> = rings
            .iter()
            .map(|ring| format!("({})", positions(ring)))
            .collect();
        format!("({})", body.join(", "))
    };
    match polygons {
        [] => Err(WktError::Empty),
        [single] => Ok(format!("POLYGON{}", render(single))),
        many => {
            let body: Vec<String> = many.iter().map(render).collect();
            Ok(format!("MULTIPOLYGON({})", body.join(", ")))
        }
    }
}

fn position(coord: &Coordinate) -> String {
    format!("{} {}", coord.lon, coord.lat)
}

fn positions(coords: &[Coordinate]) -> String {
    coords.iter().map(position).collect::<Vec<_>>().join(", ")
}

pub fn parse_wkt(text: &str) -> Result<Geometry<f64>, WktError> {
    Geometry::<f64>::try_from_wkt_str(text.trim()).map_err(|err| WktError::Parse(err.to_string()))
}

/// Coordinates of a single POINT, LINESTRING or POLYGON (exterior ring).
pub fn coordinates_from_wkt(text: &str) -> Result<Vec<Coordinate>, WktError> {
    let geometry = parse_wkt(text)?;
    match geometry {
        Geometry::Point(p) => Ok(vec![Coordinate::new(p.y(), p.x())]),
        Geometry::LineString(line) => Ok(line_coordinates(&line)),
        Geometry::Polygon(polygon) => Ok(line_coordinates(polygon.exterior())),
        other => Err(WktError::Unsupported(geometry_name(&other))),
    }
}

/// Every simple part of a WKT geometry; multi geometries yield one part per
/// member, polygon holes are dropped.
pub fn parts_from_wkt(text: &str) -> Result<Vec<WktPart>, WktError> {
    let geometry = parse_wkt(text)?;
    let mut parts = Vec::new();
    collect_parts(&geometry, &mut parts)?;
    Ok(parts)
}

fn collect_parts(geometry: &Geometry<f64>, parts: &mut Vec<WktPart>) -> Result<(), WktError> {
    match geometry {
        Geometry::Point(p) => parts.push(WktPart {
            kind: GeometryKind::Point,
            coordinates: vec![Coordinate::new(p.y(), p.x())],
        }),
        Geometry::MultiPoint(points) => {
            parts.extend(points.iter().map(|p| WktPart {
                kind: GeometryKind::Point,
                coordinates: vec![Coordinate::new(p.y(), p.x())],
            }));
        }
        Geometry::LineString(line) => parts.push(WktPart {
            kind: GeometryKind::LineString,
            coordinates: line_coordinates(line),
        }),
        Geometry::MultiLineString(lines) => {
            parts.extend(lines.iter().map(|line| WktPart {
                kind: GeometryKind::LineString,
                coordinates: line_coordinates(line),
            }));
        }
        Geometry::Polygon(polygon) => parts.push(WktPart {
            kind: GeometryKind::Polygon,
            coordinates: line_coordinates(polygon.exterior()),
        }),
        Geometry::MultiPolygon(polygons) => {
            parts.extend(polygons.iter().map(|polygon| WktPart {
                kind: GeometryKind::Polygon,
                coordinates: line_coordinates(polygon.exterior()),
            }));
        }
        Geometry::GeometryCollection(collection) => {
            for member in collection.iter() {
                collect_parts(member, parts)?;
            }
        }
        other => return Err(WktError::Unsupported(geometry_name(other))),
    }
    Ok(())
}

fn line_coordinates(line: &LineString<f64>) -> Vec<Coordinate> {
    line.coords().map(|c| Coordinate::new(c.y, c.x)).collect()
}

pub(crate) fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) => "LINE",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(45.0, 5.0),
            Coordinate::new(45.0, 5.01),
            Coordinate::new(45.01, 5.01),
            Coordinate::new(45.01, 5.0),
        ]
    }

    #[test]
    fn markers_and_labels_are_points() {
        let coords = [Coordinate::new(34.05, -118.25)];
        assert_eq!(to_wkt(&coords, MarkupType::Marker).unwrap(), "POINT(-118.25 34.05)");
        assert_eq!(to_wkt(&coords, MarkupType::Label).unwrap(), "POINT(-118.25 34.05)");
    }

    #[test]
    fn sketches_are_linestrings() {
        let coords = [Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.5)];
        assert_eq!(
            to_wkt(&coords, MarkupType::Fireline).unwrap(),
            "LINESTRING(2 1, 4.5 3)"
        );
    }

    #[test]
    fn polygons_are_closed_before_serializing() {
        let wkt = to_wkt(&square(), MarkupType::Square).unwrap();
        assert_eq!(
            wkt,
            "POLYGON((5 45, 5.01 45, 5.01 45.01, 5 45.01, 5 45))"
        );
    }

    #[test]
    fn already_closed_ring_is_not_closed_twice() {
        let mut ring = square();
        close_ring(&mut ring);
        let wkt = to_wkt(&ring, MarkupType::Polygon).unwrap();
        assert_eq!(coordinates_from_wkt(&wkt).unwrap(), ring);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(to_wkt(&[], MarkupType::Marker), Err(WktError::Empty)));
    }

    #[test]
    fn round_trip_per_type() {
        let point = vec![Coordinate::new(-33.8688, 151.2093)];
        let path = vec![
            Coordinate::new(0.1, 0.2),
            Coordinate::new(0.3, -0.4),
            Coordinate::new(12.345_678_9, 98.765_432_1),
        ];
        let mut ring = square();
        close_ring(&mut ring);

        for (coords, kind) in [
            (point, MarkupType::Marker),
            (path, MarkupType::Sketch),
            (ring, MarkupType::Polygon),
        ] {
            let wkt = to_wkt(&coords, kind).unwrap();
            assert_eq!(coordinates_from_wkt(&wkt).unwrap(), coords, "{kind}");
        }
    }

    #[test]
    fn malformed_wkt_is_a_parse_error() {
        assert!(matches!(
            coordinates_from_wkt("POLYGON((1 2, 3"),
            Err(WktError::Parse(_))
        ));
        assert!(matches!(coordinates_from_wkt("banana"), Err(WktError::Parse(_))));
    }

    #[test]
    fn multi_geometries_split_into_parts() {
        let parts = parts_from_wkt("MULTIPOINT((1 2), (3 4))").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].coordinates, vec![Coordinate::new(4.0, 3.0)]);
        assert!(matches!(
            coordinates_from_wkt("MULTIPOINT((1 2), (3 4))"),
            Err(WktError::Unsupported("MULTIPOINT"))
        ));
    }

    #[test]
    fn multipolygon_output_groups_rings() {
        let a = vec![vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ]];
        let wkt = polygons_to_wkt(&[a.clone(), a]).unwrap();
        assert!(wkt.starts_with("MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((0 0"));
        assert_eq!(parts_from_wkt(&wkt).unwrap().len(), 2);
    }
}
