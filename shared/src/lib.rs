use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Geographic position in degrees. Meaningful relative to the CRS it was
/// produced in; EPSG:4326 unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when the value lies inside the EPSG:4326 domain.
    pub fn is_valid_wgs84(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Planar pair used for projected values. `x` is longitude-like (or
/// easting), `y` latitude-like (or northing).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for Vector2 {
    fn from(coord: Coordinate) -> Self {
        Self {
            x: coord.lon,
            y: coord.lat,
        }
    }
}

impl From<Vector2> for Coordinate {
    fn from(v: Vector2) -> Self {
        Self { lat: v.y, lon: v.x }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupType {
    Marker,
    Label,
    Circle,
    Square,
    Polygon,
    Sketch,
    Fireline,
    Triangle,
    Hexagon,
}

impl MarkupType {
    pub const ALL: [MarkupType; 9] = [
        MarkupType::Marker,
        MarkupType::Label,
        MarkupType::Circle,
        MarkupType::Square,
        MarkupType::Polygon,
        MarkupType::Sketch,
        MarkupType::Fireline,
        MarkupType::Triangle,
        MarkupType::Hexagon,
    ];

    pub fn geometry_kind(self) -> GeometryKind {
        match self {
            MarkupType::Marker | MarkupType::Label => GeometryKind::Point,
            MarkupType::Sketch | MarkupType::Fireline => GeometryKind::LineString,
            MarkupType::Circle
            | MarkupType::Square
            | MarkupType::Polygon
            | MarkupType::Triangle
            | MarkupType::Hexagon => GeometryKind::Polygon,
        }
    }

    /// Fewest vertices an edit may leave behind, not counting a closing point.
    pub fn min_points(self) -> usize {
        match self.geometry_kind() {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon if self == MarkupType::Circle => 1,
            GeometryKind::Polygon => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkupType::Marker => "marker",
            MarkupType::Label => "label",
            MarkupType::Circle => "circle",
            MarkupType::Square => "square",
            MarkupType::Polygon => "polygon",
            MarkupType::Sketch => "sketch",
            MarkupType::Fireline => "fireline",
            MarkupType::Triangle => "triangle",
            MarkupType::Hexagon => "hexagon",
        }
    }
}

impl fmt::Display for MarkupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkupType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        MarkupType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Sync state of a shape relative to the collaboration server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    New,
    Update,
    Delete,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupStyle {
    /// `#RRGGBB` or `#AARRGGBB`.
    pub stroke_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    pub stroke_width: f32,
    #[serde(default)]
    pub dash_style: DashStyle,
}

impl Default for MarkupStyle {
    fn default() -> Self {
        Self {
            stroke_color: "#FF000000".into(),
            fill_color: None,
            stroke_width: 3.0,
            dash_style: DashStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    Nautical,
}

/// Conversion factors from SI (meters, square meters) into a unit system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    pub system: UnitSystem,
    pub distance_factor: f64,
    pub area_factor: f64,
    pub distance_abbrev: &'static str,
    pub area_abbrev: &'static str,
}

pub const UNIT_DEFINITIONS: [UnitDefinition; 3] = [
    UnitDefinition {
        system: UnitSystem::Metric,
        distance_factor: 1_000.0,
        area_factor: 1_000_000.0,
        distance_abbrev: "km",
        area_abbrev: "km²",
    },
    UnitDefinition {
        system: UnitSystem::Imperial,
        distance_factor: 1_609.344,
        area_factor: 4_046.856,
        distance_abbrev: "mi",
        area_abbrev: "acres",
    },
    UnitDefinition {
        system: UnitSystem::Nautical,
        distance_factor: 1_852.0,
        area_factor: 3_430_000.0,
        distance_abbrev: "nm",
        area_abbrev: "nm²",
    },
];

impl UnitSystem {
    pub fn definition(self) -> &'static UnitDefinition {
        UNIT_DEFINITIONS
            .iter()
            .find(|def| def.system == self)
            .unwrap_or(&UNIT_DEFINITIONS[0])
    }

    pub fn distance_from_meters(self, meters: f64) -> f64 {
        meters / self.definition().distance_factor
    }

    pub fn distance_to_meters(self, value: f64) -> f64 {
        value * self.definition().distance_factor
    }

    pub fn area_from_square_meters(self, square_meters: f64) -> f64 {
        square_meters / self.definition().area_factor
    }

    pub fn area_to_square_meters(self, value: f64) -> f64 {
        value * self.definition().area_factor
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Nautical => "nautical",
        }
    }
}

impl FromStr for UnitSystem {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            "nautical" => Ok(UnitSystem::Nautical),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name `{}`", self.0)
    }
}

impl std::error::Error for UnknownName {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_and_coordinate_swap_axes() {
        let coord = Coordinate::new(45.0, 5.0);
        let v = Vector2::from(coord);
        assert_eq!(v, Vector2::new(5.0, 45.0));
        assert_eq!(Coordinate::from(v), coord);
    }

    #[test]
    fn markup_types_map_to_geometry_kinds() {
        assert_eq!(MarkupType::Label.geometry_kind(), GeometryKind::Point);
        assert_eq!(MarkupType::Fireline.geometry_kind(), GeometryKind::LineString);
        assert_eq!(MarkupType::Hexagon.geometry_kind(), GeometryKind::Polygon);
        assert_eq!(MarkupType::Circle.geometry_kind(), GeometryKind::Polygon);
    }

    #[test]
    fn markup_type_parses_case_insensitively() {
        assert_eq!("FireLine".parse::<MarkupType>(), Ok(MarkupType::Fireline));
        assert!("blob".parse::<MarkupType>().is_err());
    }

    #[test]
    fn unit_factors_are_exact() {
        assert_eq!(UnitSystem::Metric.distance_from_meters(1_000.0), 1.0);
        assert_eq!(UnitSystem::Imperial.distance_from_meters(1_609.344), 1.0);
        assert_eq!(UnitSystem::Nautical.distance_from_meters(1_852.0), 1.0);
        assert_eq!(UnitSystem::Metric.area_from_square_meters(1e6), 1.0);
        assert_eq!(UnitSystem::Imperial.area_from_square_meters(4_046.856), 1.0);
        assert_eq!(UnitSystem::Nautical.area_from_square_meters(3_430_000.0), 1.0);
    }

    #[test]
    fn metric_to_imperial_round_trip() {
        let meters = 1_000.0;
        let miles = UnitSystem::Imperial.distance_from_meters(meters);
        assert!((miles - 0.621371).abs() < 1e-6);
        let back = UnitSystem::Imperial.distance_to_meters(miles);
        assert!((back - meters).abs() < 1e-9);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&SendStatus::Update).unwrap();
        assert_eq!(json, "\"update\"");
        let parsed: MarkupType = serde_json::from_str("\"sketch\"").unwrap();
        assert_eq!(parsed, MarkupType::Sketch);
    }
}
