use std::fmt;

use nics_shared::{Coordinate, UnitSystem};

use crate::spherical;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CardinalDirection {
    const OCTANTS: [CardinalDirection; 8] = [
        CardinalDirection::N,
        CardinalDirection::NE,
        CardinalDirection::E,
        CardinalDirection::SE,
        CardinalDirection::S,
        CardinalDirection::SW,
        CardinalDirection::W,
        CardinalDirection::NW,
    ];

    /// Nearest 45° sector for a heading in degrees (any range).
    pub fn from_heading(heading: f64) -> Self {
        let normalized = spherical::normalize_heading(heading);
        let sector = (normalized / 45.0).round() as usize % 8;
        Self::OCTANTS[sector]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardinalDirection::N => "N",
            CardinalDirection::NE => "NE",
            CardinalDirection::E => "E",
            CardinalDirection::SE => "SE",
            CardinalDirection::S => "S",
            CardinalDirection::SW => "SW",
            CardinalDirection::W => "W",
            CardinalDirection::NW => "NW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render with at most seven fractional digits and no trailing zeros
/// (`#.#######`).
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut text = format!("{value:.7}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

/// A converted value paired with its unit abbreviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: &'static str,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_decimal(self.value), self.unit)
    }
}

pub fn distance_in(meters: f64, units: UnitSystem) -> Measurement {
    Measurement {
        value: units.distance_from_meters(meters),
        unit: units.definition().distance_abbrev,
    }
}

pub fn area_in(square_meters: f64, units: UnitSystem) -> Measurement {
    Measurement {
        value: units.area_from_square_meters(square_meters),
        unit: units.definition().area_abbrev,
    }
}

/// Re-express a distance given in one unit system in another.
pub fn convert_distance(value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
    to.distance_from_meters(from.distance_to_meters(value))
}

pub fn convert_area(value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
    to.area_from_square_meters(from.area_to_square_meters(value))
}

/// Heading with its compass octant, e.g. `"123.4567 SE"`.
pub fn describe_heading(from: Coordinate, to: Coordinate) -> String {
    let heading = spherical::heading(from, to);
    format!(
        "{}° {}",
        format_decimal(heading),
        CardinalDirection::from_heading(heading)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_buckets_round_to_nearest_sector() {
        use CardinalDirection::*;
        let cases = [
            (0.0, N),
            (22.4, N),
            (22.6, NE),
            (90.0, E),
            (134.0, SE),
            (180.0, S),
            (224.0, SW),
            (270.0, W),
            (314.0, NW),
            (337.6, N),
            (359.9, N),
            (-45.0, NW),
            (405.0, NE),
        ];
        for (heading, expected) in cases {
            assert_eq!(CardinalDirection::from_heading(heading), expected, "{heading}");
        }
    }

    #[test]
    fn decimal_format_trims() {
        assert_eq!(format_decimal(1.0), "1");
        assert_eq!(format_decimal(0.5), "0.5");
        assert_eq!(format_decimal(1.234_567_891), "1.2345679");
        assert_eq!(format_decimal(12.000_000_01), "12");
        assert_eq!(format_decimal(-0.000_000_01), "0");
        assert_eq!(format_decimal(-2.25), "-2.25");
    }

    #[test]
    fn display_strings_carry_units() {
        assert_eq!(distance_in(1_500.0, UnitSystem::Metric).to_string(), "1.5 km");
        assert_eq!(distance_in(1_852.0, UnitSystem::Nautical).to_string(), "1 nm");
        assert_eq!(area_in(4_046.856 * 2.0, UnitSystem::Imperial).to_string(), "2 acres");
        assert_eq!(area_in(2.5e6, UnitSystem::Metric).to_string(), "2.5 km²");
    }

    #[test]
    fn metric_imperial_round_trip() {
        let km = 1.0;
        let miles = convert_distance(km, UnitSystem::Metric, UnitSystem::Imperial);
        assert!((miles - 0.621_371).abs() < 1e-6);
        let back = convert_distance(miles, UnitSystem::Imperial, UnitSystem::Metric);
        assert!((back - km).abs() < 1e-12);
        let nm2 = convert_area(3.43, UnitSystem::Metric, UnitSystem::Nautical);
        assert!((nm2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn heading_description() {
        let text = describe_heading(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert_eq!(text, "90° E");
    }
}
