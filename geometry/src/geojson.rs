//! GeoJSON ingestion. Accepts `FeatureCollection` (`features`) and
//! `GeometryCollection` (`geometries`) containers as well as a bare Feature
//! or geometry. Malformed features are logged and skipped.

use ::geojson::{feature::Id, Feature, Geometry, JsonObject, JsonValue, Value};
use nics_shared::{Coordinate, GeometryKind};

#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid GeoJSON: {0}")]
    Format(#[from] ::geojson::Error),
    #[error("document has neither `features` nor `geometries`")]
    NoContainer,
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

/// One simple shape extracted from a GeoJSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonShape {
    /// Feature id, or `feature_<n>` / `geometry_<n>` from the container
    /// position when the document has none. Members of multi geometries
    /// carry a further `_<index>` suffix.
    pub key: String,
    pub kind: GeometryKind,
    /// Point, path, or polygon exterior ring.
    pub coordinates: Vec<Coordinate>,
    pub holes: Vec<Vec<Coordinate>>,
    pub properties: JsonObject,
}

pub fn parse_geojson(text: &str) -> Result<Vec<GeoJsonShape>, GeoJsonError> {
    let value: JsonValue = serde_json::from_str(text)?;
    shapes_from_value(&value)
}

/// Containers are walked one entry at a time so a single bad feature does
/// not reject the document.
pub fn shapes_from_value(value: &JsonValue) -> Result<Vec<GeoJsonShape>, GeoJsonError> {
    let mut shapes = Vec::new();

    if let Some(features) = value.get("features").and_then(JsonValue::as_array) {
        for (index, raw) in features.iter().enumerate() {
            match Feature::try_from(raw.clone()) {
                Ok(feature) => push_feature(&feature, index, &mut shapes),
                Err(err) => tracing::warn!("skipping feature #{index}: {err}"),
            }
        }
    } else if let Some(geometries) = value.get("geometries").and_then(JsonValue::as_array) {
        for (index, raw) in geometries.iter().enumerate() {
            let parsed = Geometry::try_from(raw.clone())
                .map_err(GeoJsonError::from)
                .and_then(|geometry| expand_geometry(&geometry, &positional_key("geometry", index), &JsonObject::new()));
            match parsed {
                Ok(parsed) => shapes.extend(parsed),
                Err(err) => tracing::warn!("skipping geometry #{index}: {err}"),
            }
        }
    } else if value.get("type").and_then(JsonValue::as_str) == Some("Feature") {
        let feature = Feature::try_from(value.clone())?;
        let geometry = feature.geometry.as_ref().ok_or(GeoJsonError::MissingGeometry)?;
        let key = feature_key(&feature, 0);
        shapes = expand_geometry(geometry, &key, &feature_properties(&feature))?;
    } else if value.get("coordinates").is_some() {
        let geometry = Geometry::try_from(value.clone())?;
        shapes = expand_geometry(&geometry, &positional_key("geometry", 0), &JsonObject::new())?;
    } else {
        return Err(GeoJsonError::NoContainer);
    }

    tracing::debug!("parsed {} shapes from GeoJSON", shapes.len());
    Ok(shapes)
}

fn push_feature(feature: &Feature, index: usize, shapes: &mut Vec<GeoJsonShape>) {
    let key = feature_key(feature, index);
    let result = feature
        .geometry
        .as_ref()
        .ok_or(GeoJsonError::MissingGeometry)
        .and_then(|geometry| expand_geometry(geometry, &key, &feature_properties(feature)));
    match result {
        Ok(parsed) => shapes.extend(parsed),
        Err(err) => tracing::warn!("skipping feature #{index} ({key}): {err}"),
    }
}

fn feature_key(feature: &Feature, index: usize) -> String {
    match &feature.id {
        Some(Id::String(id)) => id.clone(),
        Some(Id::Number(id)) => id.to_string(),
        None => positional_key("feature", index),
    }
}

fn positional_key(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}")
}

fn feature_properties(feature: &Feature) -> JsonObject {
    feature.properties.clone().unwrap_or_default()
}

/// Nothing is returned unless the whole geometry parsed, so a bad member
/// never leaves half a feature behind.
fn expand_geometry(
    geometry: &Geometry,
    key: &str,
    properties: &JsonObject,
) -> Result<Vec<GeoJsonShape>, GeoJsonError> {
    let shape = |key: String, kind: GeometryKind, rings: Vec<Vec<Coordinate>>| {
        let mut rings = rings.into_iter();
        GeoJsonShape {
            key,
            kind,
            coordinates: rings.next().unwrap_or_default(),
            holes: rings.collect(),
            properties: properties.clone(),
        }
    };

    let shapes = match &geometry.value {
        Value::Point(point) => vec![shape(
            key.to_string(),
            GeometryKind::Point,
            vec![vec![position(point)?]],
        )],
        Value::LineString(line) => vec![shape(key.to_string(), GeometryKind::LineString, vec![path(line)?])],
        Value::Polygon(polygon) => vec![shape(key.to_string(), GeometryKind::Polygon, rings(polygon)?)],
        Value::MultiPoint(points) => points
            .iter()
            .enumerate()
            .map(|(i, p)| Ok(shape(member_key(key, i), GeometryKind::Point, vec![vec![position(p)?]])))
            .collect::<Result<_, GeoJsonError>>()?,
        Value::MultiLineString(lines) => lines
            .iter()
            .enumerate()
            .map(|(i, l)| Ok(shape(member_key(key, i), GeometryKind::LineString, vec![path(l)?])))
            .collect::<Result<_, GeoJsonError>>()?,
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .enumerate()
            .map(|(i, p)| Ok(shape(member_key(key, i), GeometryKind::Polygon, rings(p)?)))
            .collect::<Result<_, GeoJsonError>>()?,
        Value::GeometryCollection(members) => {
            let mut shapes = Vec::new();
            for (i, member) in members.iter().enumerate() {
                shapes.extend(expand_geometry(member, &member_key(key, i), properties)?);
            }
            shapes
        }
    };

    Ok(shapes)
}

fn member_key(key: &str, index: usize) -> String {
    format!("{key}_{index}")
}

fn position(position: &[f64]) -> Result<Coordinate, GeoJsonError> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Coordinate::new(*lat, *lon)),
        _ => Err(GeoJsonError::InvalidCoordinates(format!("bad position {position:?}"))),
    }
}

fn path(positions: &[Vec<f64>]) -> Result<Vec<Coordinate>, GeoJsonError> {
    positions.iter().map(|p| position(p)).collect()
}

fn rings(polygon: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Coordinate>>, GeoJsonError> {
    let rings: Vec<Vec<Coordinate>> = polygon.iter().map(|ring| path(ring)).collect::<Result<_, _>>()?;
    if rings.first().map_or(true, |ring| ring.len() < 3) {
        return Err(GeoJsonError::InvalidCoordinates(
            "polygon needs an exterior ring of at least 3 positions".into(),
        ));
    }
    Ok(rings)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "a", "properties": {"type": "marker"},
                 "geometry": {"type": "Point", "coordinates": [5.0, 45.0]}},
                {"type": "Feature", "id": 7, "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[5.0, 45.0], [5.1, 45.1]]}}
            ]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].key, "a");
        assert_eq!(shapes[0].coordinates, vec![Coordinate::new(45.0, 5.0)]);
        assert_eq!(shapes[0].properties["type"], "marker");
        assert_eq!(shapes[1].key, "7");
        assert_eq!(shapes[1].kind, GeometryKind::LineString);
    }

    #[test]
    fn parses_geometry_collection() {
        let doc = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]},
                {"type": "Point", "coordinates": [1, 2]}
            ]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].kind, GeometryKind::Polygon);
        assert_eq!(shapes[0].coordinates.len(), 4);
        assert_ne!(shapes[0].key, shapes[1].key);
    }

    #[test]
    fn identical_geometries_get_distinct_keys() {
        let doc = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [1, 2]},
                {"type": "Point", "coordinates": [1, 2]}
            ]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].coordinates, shapes[1].coordinates);
        assert_ne!(shapes[0].key, shapes[1].key);

        let doc = json!({"features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]});
        let keys: Vec<String> = shapes_from_value(&doc).unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, ["feature_0", "feature_1"]);
    }

    #[test]
    fn multi_members_get_distinct_keys() {
        let doc = json!({
            "features": [{
                "type": "Feature", "id": "fire",
                "geometry": {"type": "MultiLineString", "coordinates": [
                    [[0, 0], [1, 1]],
                    [[2, 2], [3, 3]],
                    [[4, 4], [5, 5]]
                ]}
            }]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        let keys: Vec<&str> = shapes.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["fire_0", "fire_1", "fire_2"]);
    }

    #[test]
    fn nested_geometry_collection_is_flattened() {
        let doc = json!({
            "features": [{
                "type": "Feature", "id": "camp",
                "geometry": {"type": "GeometryCollection", "geometries": [
                    {"type": "Point", "coordinates": [1, 2]},
                    {"type": "MultiPoint", "coordinates": [[3, 4], [5, 6]]}
                ]}
            }]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        let keys: Vec<&str> = shapes.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["camp_0", "camp_1_0", "camp_1_1"]);
    }

    #[test]
    fn multipolygon_keeps_holes() {
        let doc = json!({
            "features": [{
                "type": "Feature",
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0, 0], [10, 0], [10, 10], [0, 0]], [[1, 1], [2, 1], [2, 2], [1, 1]]],
                    [[[20, 20], [30, 20], [30, 30], [20, 20]]]
                ]}
            }]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].holes.len(), 1);
        assert!(shapes[0].key.ends_with("_0"));
        assert!(shapes[1].key.ends_with("_1"));
    }

    #[test]
    fn malformed_feature_is_skipped_not_fatal() {
        let doc = json!({
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": ["x", 1]}},
                {"type": "Feature", "geometry": {"type": "Circle", "coordinates": [0, 0]}},
                {"type": "Feature", "geometry": null},
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 1]]]}},
                {"type": "Feature", "id": "ok", "geometry": {"type": "Point", "coordinates": [1, 2]}}
            ]
        });
        let shapes = shapes_from_value(&doc).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].key, "ok");
    }

    #[test]
    fn bad_member_drops_the_whole_multi_feature() {
        let doc = json!({
            "features": [{
                "type": "Feature", "id": "m",
                "geometry": {"type": "MultiPoint", "coordinates": [[0, 0], [1]]}
            }]
        });
        assert!(shapes_from_value(&doc).unwrap().is_empty());
    }

    #[test]
    fn bare_feature_and_geometry_are_accepted() {
        let feature = r#"{"type":"Feature","id":"x","geometry":{"type":"Point","coordinates":[1,2]}}"#;
        assert_eq!(parse_geojson(feature).unwrap()[0].key, "x");
        let geometry = r#"{"type":"LineString","coordinates":[[1,2],[3,4]]}"#;
        let shapes = parse_geojson(geometry).unwrap();
        assert_eq!(shapes[0].coordinates.len(), 2);
        assert_eq!(shapes[0].key, "geometry_0");
    }

    #[test]
    fn document_without_container_fails() {
        assert!(matches!(parse_geojson("{\"foo\": 1}"), Err(GeoJsonError::NoContainer)));
        assert!(matches!(parse_geojson("not json"), Err(GeoJsonError::Json(_))));
        assert!(matches!(
            parse_geojson(r#"{"type":"Feature","geometry":{"type":"Circle","coordinates":[0,0]}}"#),
            Err(GeoJsonError::Format(_))
        ));
    }

    #[test]
    fn keyless_features_are_keyed_by_position() {
        let doc = json!({"features": [
            {"type": "Feature", "id": "named", "geometry": {"type": "Point", "coordinates": [0, 0]}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]});
        let a = shapes_from_value(&doc).unwrap();
        let b = shapes_from_value(&doc).unwrap();
        assert_eq!(a[1].key, "feature_1");
        assert_eq!(a[1].key, b[1].key);
    }
}
