//! User-drawn markup shapes and the edits a map interaction can apply.

use std::fmt;

use ::geojson::{feature::Id, Feature, Geometry, JsonObject, Value as GeoJsonValue};
use chrono::{DateTime, Utc};
use nics_shared::{Coordinate, GeometryKind, MarkupStyle, MarkupType, SendStatus, UnitSystem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    circle,
    geojson::GeoJsonShape,
    measurement::{self, Measurement},
    spherical,
    well_known_text::{self, WktError},
};

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("{markup_type} needs at least {min} points, got {found}")]
    TooFewPoints {
        markup_type: MarkupType,
        min: usize,
        found: usize,
    },
    #[error("point index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} shapes do not take vertex edits")]
    FixedVertices(MarkupType),
    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),
    #[error("{markup_type} cannot hold a {kind:?} geometry")]
    KindMismatch {
        markup_type: MarkupType,
        kind: GeometryKind,
    },
    #[error(transparent)]
    Wkt(#[from] WktError),
}

/// A feature drawn on the map.
///
/// Vertices are kept without a closing point; rings are closed when
/// rendered or serialized. Circles keep their center as the only vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupShape {
    pub feature_id: String,
    pub markup_type: MarkupType,
    points: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radius_m: Option<f64>,
    pub style: MarkupStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub username: String,
    pub status: SendStatus,
    pub last_update: DateTime<Utc>,
}

impl MarkupShape {
    pub fn new(
        feature_id: impl Into<String>,
        markup_type: MarkupType,
        points: Vec<Coordinate>,
        username: impl Into<String>,
    ) -> Result<Self, MarkupError> {
        // a circle drawn from points is its center followed by an edge point
        if markup_type == MarkupType::Circle {
            let (Some(center), Some(edge)) = (points.first(), points.get(1)) else {
                return Err(MarkupError::TooFewPoints {
                    markup_type,
                    min: 2,
                    found: points.len(),
                });
            };
            let radius = circle::radius_from_two_points(*center, *edge);
            return Self::circle(feature_id, *center, radius, username);
        }

        let mut points = points;
        if markup_type.geometry_kind() == GeometryKind::Polygon && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        check_min_points(markup_type, points.len())?;

        Ok(Self {
            feature_id: feature_id.into(),
            markup_type,
            points,
            radius_m: None,
            style: MarkupStyle::default(),
            comment: None,
            username: username.into(),
            status: SendStatus::New,
            last_update: Utc::now(),
        })
    }

    pub fn circle(
        feature_id: impl Into<String>,
        center: Coordinate,
        radius_m: f64,
        username: impl Into<String>,
    ) -> Result<Self, MarkupError> {
        validate_radius(radius_m)?;
        Ok(Self {
            feature_id: feature_id.into(),
            markup_type: MarkupType::Circle,
            points: vec![center],
            radius_m: Some(radius_m),
            style: MarkupStyle::default(),
            comment: None,
            username: username.into(),
            status: SendStatus::New,
            last_update: Utc::now(),
        })
    }

    pub fn with_style(mut self, style: MarkupStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn radius_m(&self) -> Option<f64> {
        self.radius_m
    }

    pub fn center(&self) -> Option<Coordinate> {
        match self.markup_type {
            MarkupType::Circle => self.points.first().copied(),
            _ => None,
        }
    }

    /// Drag the whole shape by a latitude/longitude delta in degrees.
    pub fn translate(&mut self, delta_lat: f64, delta_lon: f64) {
        for point in &mut self.points {
            point.lat = (point.lat + delta_lat).clamp(-90.0, 90.0);
            point.lon = wrap_longitude(point.lon + delta_lon);
        }
        self.touch();
    }

    pub fn add_point(&mut self, point: Coordinate) -> Result<(), MarkupError> {
        self.ensure_vertex_editable()?;
        self.points.push(point);
        self.touch();
        Ok(())
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert_point(&mut self, index: usize, point: Coordinate) -> Result<(), MarkupError> {
        self.ensure_vertex_editable()?;
        if index > self.points.len() {
            return Err(MarkupError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        self.points.insert(index, point);
        self.touch();
        Ok(())
    }

    /// Moving a circle's only vertex moves its center.
    pub fn move_point(&mut self, index: usize, point: Coordinate) -> Result<(), MarkupError> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(MarkupError::IndexOutOfRange { index, len })?;
        *slot = point;
        self.touch();
        Ok(())
    }

    pub fn remove_point(&mut self, index: usize) -> Result<Coordinate, MarkupError> {
        self.ensure_vertex_editable()?;
        let len = self.points.len();
        if index >= len {
            return Err(MarkupError::IndexOutOfRange { index, len });
        }
        check_min_points(self.markup_type, len - 1)?;
        let removed = self.points.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn set_radius(&mut self, radius_m: f64) -> Result<(), MarkupError> {
        if self.markup_type != MarkupType::Circle {
            return Err(MarkupError::FixedVertices(self.markup_type));
        }
        validate_radius(radius_m)?;
        self.radius_m = Some(radius_m);
        self.touch();
        Ok(())
    }

    /// Resize a circle so its edge passes through `edge`.
    pub fn set_radius_through(&mut self, edge: Coordinate) -> Result<(), MarkupError> {
        let center = self
            .center()
            .ok_or(MarkupError::FixedVertices(self.markup_type))?;
        self.set_radius(circle::radius_from_two_points(center, edge))
    }

    /// Coordinates handed to a renderer: closed ring for polygons, sampled
    /// ring for circles, vertices otherwise.
    pub fn render_points(&self, circle_segments: usize) -> Vec<Coordinate> {
        match (self.markup_type, self.center(), self.radius_m) {
            (MarkupType::Circle, Some(center), Some(radius)) => {
                circle::circle_to_polygon(center, radius, circle_segments)
            }
            _ if self.markup_type.geometry_kind() == GeometryKind::Polygon => {
                let mut ring = self.points.clone();
                well_known_text::close_ring(&mut ring);
                ring
            }
            _ => self.points.clone(),
        }
    }

    pub fn to_wkt(&self, circle_segments: usize) -> Result<String, MarkupError> {
        let points = self.render_points(circle_segments);
        Ok(well_known_text::to_wkt(&points, self.markup_type)?)
    }

    pub fn measure(&self, units: UnitSystem, circle_segments: usize) -> MeasurementSummary {
        let mut summary = MeasurementSummary {
            units,
            ..MeasurementSummary::default()
        };
        match self.markup_type.geometry_kind() {
            GeometryKind::Point => {}
            GeometryKind::LineString => {
                summary.length = Some(measurement::distance_in(spherical::distance(&self.points), units));
            }
            GeometryKind::Polygon => {
                let ring = self.render_points(circle_segments);
                summary.perimeter = Some(measurement::distance_in(spherical::perimeter(&ring), units));
                summary.area = Some(measurement::area_in(spherical::area(&ring), units));
                if let Some(radius) = self.radius_m {
                    summary.radius = Some(measurement::distance_in(radius, units));
                }
            }
        }
        summary
    }

    /// Where a label for this shape goes: the center for circles, the
    /// bounding-box midpoint otherwise.
    pub fn label_position(&self) -> Option<Coordinate> {
        self.center().or_else(|| spherical::midpoint(&self.points))
    }

    /// GeoJSON `Feature` with the style, comment and authorship as
    /// properties. Coordinates are `[lon, lat]`.
    pub fn to_geojson_feature(&self, circle_segments: usize) -> Feature {
        let points = self.render_points(circle_segments);
        let positions = || points.iter().map(|c| vec![c.lon, c.lat]).collect::<Vec<_>>();
        let value = match self.markup_type.geometry_kind() {
            GeometryKind::Point => GeoJsonValue::Point(positions().into_iter().next().unwrap_or_default()),
            GeometryKind::LineString => GeoJsonValue::LineString(positions()),
            GeometryKind::Polygon => GeoJsonValue::Polygon(vec![positions()]),
        };

        let mut properties = match serde_json::to_value(&self.style) {
            Ok(Value::Object(map)) => map,
            _ => JsonObject::new(),
        };
        properties.insert("type".into(), json!(self.markup_type));
        properties.insert("username".into(), json!(self.username));
        properties.insert("status".into(), json!(self.status));
        properties.insert("last_update".into(), json!(self.last_update.to_rfc3339()));
        if let Some(comment) = &self.comment {
            properties.insert("comment".into(), json!(comment));
        }
        if let Some(radius) = self.radius_m {
            properties.insert("radius".into(), json!(radius));
        }

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: Some(Id::String(self.feature_id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Rebuild a shape from a parsed GeoJSON entry. The markup type comes
    /// from the `type` property when present, otherwise from the geometry.
    /// A stored `status` and `last_update` are kept.
    pub fn from_geojson(shape: &GeoJsonShape, username: &str) -> Result<Self, MarkupError> {
        let props = &shape.properties;
        let markup_type = props
            .get("type")
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<MarkupType>().ok())
            .unwrap_or(match shape.kind {
                GeometryKind::Point => MarkupType::Marker,
                GeometryKind::LineString => MarkupType::Sketch,
                GeometryKind::Polygon => MarkupType::Polygon,
            });

        let radius = props.get("radius").and_then(Value::as_f64);
        let mut markup = match (markup_type, radius) {
            (MarkupType::Circle, radius) => {
                let center = spherical::midpoint(&shape.coordinates).ok_or(MarkupError::TooFewPoints {
                    markup_type,
                    min: 1,
                    found: 0,
                })?;
                let radius = radius.unwrap_or_else(|| circle::smallest_enclosing_radius(&shape.coordinates));
                Self::circle(shape.key.clone(), center, radius, username)?
            }
            _ => {
                if markup_type.geometry_kind() != shape.kind {
                    return Err(MarkupError::KindMismatch {
                        markup_type,
                        kind: shape.kind,
                    });
                }
                Self::new(shape.key.clone(), markup_type, shape.coordinates.clone(), username)?
            }
        };

        if let Ok(style) = serde_json::from_value::<MarkupStyle>(Value::Object(props.clone())) {
            markup.style = style;
        }
        markup.comment = props.get("comment").and_then(Value::as_str).map(str::to_string);
        if let Some(author) = props.get("username").and_then(Value::as_str) {
            markup.username = author.to_string();
        }
        if let Some(status) = props
            .get("status")
            .and_then(|status| serde_json::from_value::<SendStatus>(status.clone()).ok())
        {
            markup.status = status;
        }
        if let Some(updated) = props
            .get("last_update")
            .and_then(Value::as_str)
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        {
            markup.last_update = updated.with_timezone(&Utc);
        }
        Ok(markup)
    }

    /// Record a local edit: anything already on the server becomes an update.
    fn touch(&mut self) {
        if self.status != SendStatus::New {
            self.status = SendStatus::Update;
        }
        self.last_update = Utc::now();
    }

    fn ensure_vertex_editable(&self) -> Result<(), MarkupError> {
        match self.markup_type {
            MarkupType::Marker | MarkupType::Label | MarkupType::Circle => {
                Err(MarkupError::FixedVertices(self.markup_type))
            }
            _ => Ok(()),
        }
    }
}

fn check_min_points(markup_type: MarkupType, found: usize) -> Result<(), MarkupError> {
    let min = markup_type.min_points();
    if found < min {
        return Err(MarkupError::TooFewPoints {
            markup_type,
            min,
            found,
        });
    }
    Ok(())
}

fn validate_radius(radius_m: f64) -> Result<(), MarkupError> {
    if radius_m.is_finite() && radius_m > 0.0 {
        Ok(())
    } else {
        Err(MarkupError::InvalidRadius(radius_m))
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Display values for a shape, already converted to one unit system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementSummary {
    pub units: UnitSystem,
    pub length: Option<Measurement>,
    pub perimeter: Option<Measurement>,
    pub area: Option<Measurement>,
    pub radius: Option<Measurement>,
}

impl MeasurementSummary {
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.perimeter.is_none() && self.area.is_none()
    }
}

impl fmt::Display for MeasurementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("Distance", self.length),
            ("Radius", self.radius),
            ("Perimeter", self.perimeter),
            ("Area", self.area),
        ];
        let mut first = true;
        for (label, value) in parts {
            if let Some(value) = value {
                if !first {
                    f.write_str("\n")?;
                }
                write!(f, "{label}: {value}")?;
                first = false;
            }
        }
        Ok(())
    }
}
