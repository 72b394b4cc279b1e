use std::{cell::RefCell, collections::HashMap, num::NonZeroUsize, rc::Rc};

use lru::LruCache;
use nics_shared::{Coordinate, Vector2};
use once_cell::sync::Lazy;
use proj::Proj;

pub const WGS84: u32 = 4326;
pub const NAD83: u32 = 4269;
pub const WEB_MERCATOR: u32 = 3857;
pub const WORLD_MERCATOR: u32 = 3395;
pub const GOOGLE_MERCATOR: u32 = 900913;

pub const DEFAULT_TRANSFORM_CACHE: usize = 16;

const UTM_NORTH_BASE: u32 = 32600;
const UTM_SOUTH_BASE: u32 = 32700;

const SPHERICAL_MERCATOR_PARAMS: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs";

const STATIC_DEFINITIONS: [(u32, &str, &str); 5] = [
    (WGS84, "WGS 84", "+proj=longlat +datum=WGS84 +no_defs +type=crs"),
    (NAD83, "NAD83", "+proj=longlat +ellps=GRS80 +datum=NAD83 +no_defs +type=crs"),
    (WEB_MERCATOR, "WGS 84 / Pseudo-Mercator", SPHERICAL_MERCATOR_PARAMS),
    (
        WORLD_MERCATOR,
        "WGS 84 / World Mercator",
        "+proj=merc +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs +type=crs",
    ),
    (GOOGLE_MERCATOR, "Google Mercator", SPHERICAL_MERCATOR_PARAMS),
];

/// A named CRS and the parameter string used to build transforms from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsDefinition {
    pub code: u32,
    pub name: String,
    pub params: String,
}

static REGISTRY: Lazy<HashMap<u32, CrsDefinition>> = Lazy::new(|| {
    let mut registry = HashMap::with_capacity(STATIC_DEFINITIONS.len() + 120);
    for (code, name, params) in STATIC_DEFINITIONS {
        registry.insert(
            code,
            CrsDefinition {
                code,
                name: name.to_string(),
                params: params.to_string(),
            },
        );
    }
    for zone in 1..=60u32 {
        for (base, south, hemisphere) in [(UTM_NORTH_BASE, "", 'N'), (UTM_SOUTH_BASE, " +south", 'S')] {
            let code = base + zone;
            registry.insert(
                code,
                CrsDefinition {
                    code,
                    name: format!("WGS 84 / UTM zone {zone}{hemisphere}"),
                    params: format!(
                        "+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs"
                    ),
                },
            );
        }
    }
    registry
});

pub fn lookup(code: u32) -> Result<&'static CrsDefinition, TransformError> {
    REGISTRY.get(&code).ok_or(TransformError::UnknownEpsg(code))
}

/// EPSG code of the WGS84 UTM zone CRS for a zone number and hemisphere.
pub fn utm_epsg(zone: u8, southern: bool) -> Result<u32, TransformError> {
    if !(1..=60).contains(&zone) {
        return Err(TransformError::InvalidUtmZone(zone));
    }
    let base = if southern { UTM_SOUTH_BASE } else { UTM_NORTH_BASE };
    Ok(base + u32::from(zone))
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("unknown EPSG code {0}")]
    UnknownEpsg(u32),
    #[error("invalid UTM zone {0}")]
    InvalidUtmZone(u8),
    #[error("cannot build transform EPSG:{from} -> EPSG:{to}: {reason}")]
    Unbridgeable { from: u32, to: u32, reason: String },
    #[error("failed to transform ({x}, {y}) from EPSG:{from} to EPSG:{to}: {reason}")]
    Point {
        from: u32,
        to: u32,
        x: f64,
        y: f64,
        reason: String,
    },
}

/// Transform between two registered CRSs. Built once and applied to any
/// number of points; an identity pair never touches PROJ.
pub struct CrsTransform {
    from: u32,
    to: u32,
    proj: Option<Proj>,
}

impl std::fmt::Debug for CrsTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransform")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("identity", &self.proj.is_none())
            .finish()
    }
}

impl CrsTransform {
    pub fn new(from: u32, to: u32) -> Result<Self, TransformError> {
        let source = lookup(from)?;
        let target = lookup(to)?;
        if from == to {
            return Ok(Self { from, to, proj: None });
        }
        let proj = Proj::new_known_crs(&source.params, &target.params, None).map_err(|err| {
            TransformError::Unbridgeable {
                from,
                to,
                reason: err.to_string(),
            }
        })?;
        tracing::debug!("built transform EPSG:{from} -> EPSG:{to}");
        Ok(Self {
            from,
            to,
            proj: Some(proj),
        })
    }

    pub fn source(&self) -> u32 {
        self.from
    }

    pub fn target(&self) -> u32 {
        self.to
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    pub fn apply(&self, point: Vector2) -> Result<Vector2, TransformError> {
        let Some(proj) = self.proj.as_ref() else {
            return Ok(point);
        };
        let (x, y) = proj
            .convert((point.x, point.y))
            .map_err(|err| self.point_error(point, err.to_string()))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(self.point_error(point, "non-finite result".into()));
        }
        Ok(Vector2::new(x, y))
    }

    pub fn apply_all(&self, points: &[Vector2]) -> Result<Vec<Vector2>, TransformError> {
        if self.is_identity() {
            return Ok(points.to_vec());
        }
        points.iter().map(|p| self.apply(*p)).collect()
    }

    pub fn apply_coordinate(&self, coord: Coordinate) -> Result<Coordinate, TransformError> {
        if self.is_identity() {
            return Ok(coord);
        }
        self.apply(Vector2::from(coord)).map(Coordinate::from)
    }

    fn point_error(&self, point: Vector2, reason: String) -> TransformError {
        TransformError::Point {
            from: self.from,
            to: self.to,
            x: point.x,
            y: point.y,
            reason,
        }
    }
}

thread_local! {
    static TRANSFORMS: RefCell<LruCache<(u32, u32), Rc<CrsTransform>>> =
        RefCell::new(LruCache::new(cache_capacity(DEFAULT_TRANSFORM_CACHE)));
}

fn cache_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

/// Resize the calling thread's transform cache.
pub fn set_transform_cache_capacity(capacity: usize) {
    TRANSFORMS.with(|cache| cache.borrow_mut().resize(cache_capacity(capacity)));
}

/// Fetch (or build and remember) the transform for a CRS pair on this thread.
pub fn cached_transform(from: u32, to: u32) -> Result<Rc<CrsTransform>, TransformError> {
    TRANSFORMS.with(|cache| {
        if let Some(hit) = cache.borrow_mut().get(&(from, to)) {
            return Ok(Rc::clone(hit));
        }
        let transform = Rc::new(CrsTransform::new(from, to)?);
        cache.borrow_mut().put((from, to), Rc::clone(&transform));
        Ok(transform)
    })
}

/// Convert one coordinate. Identical CRSs return the input untouched.
pub fn transform(from: u32, to: u32, coord: Coordinate) -> Result<Coordinate, TransformError> {
    if from == to {
        lookup(from)?;
        return Ok(coord);
    }
    cached_transform(from, to)?.apply_coordinate(coord)
}

/// Convert a batch with a single transform instance.
pub fn transform_points(
    from: u32,
    to: u32,
    points: &[Vector2],
) -> Result<Vec<Vector2>, TransformError> {
    cached_transform(from, to)?.apply_all(points)
}

/// Like [`transform`], but logs the failure and yields `None` so callers can
/// clear whatever they were about to plot.
pub fn transform_or_none(from: u32, to: u32, coord: Coordinate) -> Option<Coordinate> {
    match transform(from, to, coord) {
        Ok(c) => Some(c),
        Err(err) => {
            tracing::warn!("dropping coordinate {coord:?}: {err}");
            None
        }
    }
}

pub fn transform_points_or_none(from: u32, to: u32, points: &[Vector2]) -> Option<Vec<Vector2>> {
    match transform_points(from, to, points) {
        Ok(out) => Some(out),
        Err(err) => {
            tracing::warn!("dropping {} points: {err}", points.len());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_static_and_utm_entries() {
        assert_eq!(lookup(WGS84).unwrap().name, "WGS 84");
        assert!(lookup(32611).unwrap().params.contains("+zone=11"));
        assert!(lookup(32733).unwrap().params.contains("+south"));
        assert!(matches!(lookup(1234), Err(TransformError::UnknownEpsg(1234))));
    }

    #[test]
    fn utm_epsg_codes() {
        assert_eq!(utm_epsg(11, false).unwrap(), 32611);
        assert_eq!(utm_epsg(60, true).unwrap(), 32760);
        assert!(utm_epsg(0, false).is_err());
        assert!(utm_epsg(61, true).is_err());
    }

    #[test]
    fn identity_returns_exact_input() {
        let coord = Coordinate::new(34.052_234_123_456_7, -118.243_684_987_654_3);
        let out = transform(WGS84, WGS84, coord).unwrap();
        assert_eq!(out.lat.to_bits(), coord.lat.to_bits());
        assert_eq!(out.lon.to_bits(), coord.lon.to_bits());
    }

    #[test]
    fn identity_with_unknown_code_still_fails() {
        assert!(transform(42, 42, Coordinate::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn unknown_code_yields_none_in_lenient_path() {
        assert!(transform_or_none(WGS84, 99, Coordinate::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn origin_maps_to_mercator_origin() {
        let out = transform(WGS84, WEB_MERCATOR, Coordinate::new(0.0, 0.0)).unwrap();
        assert!(out.lat.abs() < 1e-6);
        assert!(out.lon.abs() < 1e-6);
    }

    #[test]
    fn mercator_round_trip() {
        let points = [Vector2::new(-118.25, 34.05), Vector2::new(2.35, 48.85)];
        let projected = transform_points(WGS84, WEB_MERCATOR, &points).unwrap();
        assert!((projected[0].x - (-13_163_598.0)).abs() < 1_000.0);
        let back = transform_points(WEB_MERCATOR, WGS84, &projected).unwrap();
        for (a, b) in points.iter().zip(&back) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn cache_reuses_instances() {
        let a = cached_transform(WGS84, WEB_MERCATOR).unwrap();
        let b = cached_transform(WGS84, WEB_MERCATOR).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_identity_transform_is_exact(lat in -90.0..=90.0f64, lon in -180.0..=180.0f64) {
                let coord = Coordinate::new(lat, lon);
                prop_assert_eq!(transform(WGS84, WGS84, coord).unwrap(), coord);
                prop_assert_eq!(transform(WEB_MERCATOR, WEB_MERCATOR, coord).unwrap(), coord);
            }
        }
    }
}
