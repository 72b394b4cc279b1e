//! Buffer a WGS84 geometry by a distance in meters.
//!
//! Buffering in degrees is meaningless, so the geometry is projected to
//! EPSG:3857, buffered there, and projected back.

use geo::{Buffer, MapCoords};
use geo_types::{Coord, Geometry, MultiPolygon};
use nics_shared::{Coordinate, Vector2};

use crate::{
    crs::{self, CrsTransform, TransformError},
    well_known_text::{self, WktError},
};

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error(transparent)]
    Wkt(#[from] WktError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("distance must be finite, got {0}")]
    InvalidDistance(f64),
    #[error("buffer produced no geometry")]
    NullGeometry,
}

/// Buffered outline: one entry per resulting polygon, each holding the
/// exterior ring followed by any holes, in EPSG:4326.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedOutline {
    pub polygons: Vec<Vec<Vec<Coordinate>>>,
}

impl BufferedOutline {
    /// Every ring in output order, for renderers that only draw rings.
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Coordinate>> {
        self.polygons.iter().flatten()
    }

    pub fn to_wkt(&self) -> Result<String, WktError> {
        well_known_text::polygons_to_wkt(&self.polygons)
    }
}

pub fn buffer_wkt(wkt: &str, distance_m: f64) -> Result<BufferedOutline, BufferError> {
    if !distance_m.is_finite() {
        return Err(BufferError::InvalidDistance(distance_m));
    }

    let geographic = well_known_text::parse_wkt(wkt)?;

    let forward = crs::cached_transform(crs::WGS84, crs::WEB_MERCATOR)?;
    let planar = project(&geographic, &forward)?;

    let buffered = if distance_m == 0.0 {
        areal_part(planar)
    } else {
        planar.buffer(distance_m)
    };
    if buffered.0.is_empty() {
        tracing::debug!("buffer of {distance_m} m collapsed the geometry");
        return Err(BufferError::NullGeometry);
    }

    let inverse = crs::cached_transform(crs::WEB_MERCATOR, crs::WGS84)?;
    let polygons = buffered
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| {
                    let planar: Vec<Vector2> = ring.coords().map(|c| Vector2::new(c.x, c.y)).collect();
                    inverse
                        .apply_all(&planar)
                        .map(|points| points.into_iter().map(Coordinate::from).collect::<Vec<_>>())
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BufferedOutline { polygons })
}

/// Lenient variant: logs and returns `None` so the caller can clear the
/// rendered buffer instead.
pub fn buffer_wkt_or_none(wkt: &str, distance_m: f64) -> Option<BufferedOutline> {
    match buffer_wkt(wkt, distance_m) {
        Ok(outline) => Some(outline),
        Err(err) => {
            tracing::warn!("buffer of {distance_m} m failed: {err}");
            None
        }
    }
}

fn project(geometry: &Geometry<f64>, transform: &CrsTransform) -> Result<Geometry<f64>, TransformError> {
    geometry.try_map_coords(|c| {
        transform
            .apply(Vector2::new(c.x, c.y))
            .map(|v| Coord { x: v.x, y: v.y })
    })
}

/// A zero-distance buffer keeps areal geometry as is and has no area for
/// points or lines.
fn areal_part(geometry: Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(polygons) => polygons,
        Geometry::Rect(rect) => MultiPolygon::new(vec![rect.to_polygon()]),
        Geometry::Triangle(triangle) => MultiPolygon::new(vec![triangle.to_polygon()]),
        Geometry::GeometryCollection(collection) => MultiPolygon::new(
            collection
                .into_iter()
                .flat_map(|member| areal_part(member).0)
                .collect(),
        ),
        _ => MultiPolygon::new(Vec::new()),
    }
}
