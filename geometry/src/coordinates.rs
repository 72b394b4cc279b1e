//! Parsing and formatting of coordinate text typed by users: decimal
//! degrees and degrees-minutes-seconds.

use std::fmt;

use nics_shared::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn hemispheres(self) -> (char, char) {
        match self {
            Axis::Latitude => ('N', 'S'),
            Axis::Longitude => ('E', 'W'),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateFormatError {
    #[error("no coordinate entered")]
    Empty,
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error("{axis} {value} is outside ±{limit}")]
    OutOfRange { axis: Axis, value: f64, limit: f64 },
    #[error("hemisphere `{found}` does not apply to {axis}")]
    WrongHemisphere { axis: Axis, found: char },
    #[error("{field} must be in [0, 60), got {value}")]
    InvalidComponent { field: &'static str, value: f64 },
    #[error("invalid DMS text `{0}`")]
    InvalidDms(String),
    #[error("invalid MGRS `{input}`: {reason}")]
    InvalidMgrs { input: String, reason: String },
}

/// Split off a leading or trailing hemisphere letter, returning the sign it
/// implies.
fn split_hemisphere(text: &str, axis: Axis) -> Result<(&str, f64), CoordinateFormatError> {
    let (positive, negative) = axis.hemispheres();
    let trimmed = text.trim();
    let first = trimmed.chars().next();
    let last = trimmed.chars().last();
    let (letter, rest) = match (first, last) {
        (Some(c), _) if c.is_ascii_alphabetic() => (Some(c), &trimmed[c.len_utf8()..]),
        (_, Some(c)) if c.is_ascii_alphabetic() => (Some(c), &trimmed[..trimmed.len() - c.len_utf8()]),
        _ => (None, trimmed),
    };
    match letter.map(|c| c.to_ascii_uppercase()) {
        None => Ok((rest.trim(), 1.0)),
        Some(c) if c == positive => Ok((rest.trim(), 1.0)),
        Some(c) if c == negative => Ok((rest.trim(), -1.0)),
        Some(c) => Err(CoordinateFormatError::WrongHemisphere { axis, found: c }),
    }
}

fn check_range(value: f64, axis: Axis) -> Result<f64, CoordinateFormatError> {
    let limit = axis.limit();
    if value.is_finite() && value.abs() <= limit {
        Ok(value)
    } else {
        Err(CoordinateFormatError::OutOfRange { axis, value, limit })
    }
}

/// `"34.05"`, `"-118.25"`, `"34.05N"`, `"W 118.25"`.
pub fn parse_decimal_degrees(text: &str, axis: Axis) -> Result<f64, CoordinateFormatError> {
    if text.trim().is_empty() {
        return Err(CoordinateFormatError::Empty);
    }
    let (number, sign) = split_hemisphere(text, axis)?;
    let value: f64 = number
        .trim_end_matches('°')
        .trim()
        .parse()
        .map_err(|_| CoordinateFormatError::InvalidNumber(text.trim().to_string()))?;
    if sign < 0.0 && value < 0.0 {
        return Err(CoordinateFormatError::InvalidNumber(text.trim().to_string()));
    }
    check_range(value * sign, axis)
}

/// Both fields of a lat/lon text-entry pair.
pub fn parse_coordinate_pair(lat: &str, lon: &str) -> Result<Coordinate, CoordinateFormatError> {
    Ok(Coordinate::new(
        parse_decimal_degrees(lat, Axis::Latitude)?,
        parse_decimal_degrees(lon, Axis::Longitude)?,
    ))
}

/// Degrees, minutes and seconds as separate fields. The sign comes from
/// the degrees field or from `negative` (a S/W hemisphere selector).
pub fn dms_components_to_decimal(
    degrees: &str,
    minutes: &str,
    seconds: &str,
    negative: bool,
    axis: Axis,
) -> Result<f64, CoordinateFormatError> {
    if degrees.trim().is_empty() {
        return Err(CoordinateFormatError::Empty);
    }
    let parse = |field: &str| -> Result<f64, CoordinateFormatError> {
        let field = field.trim();
        if field.is_empty() {
            return Ok(0.0);
        }
        field
            .parse()
            .map_err(|_| CoordinateFormatError::InvalidNumber(field.to_string()))
    };
    let deg = parse(degrees)?;
    let min = parse(minutes)?;
    let sec = parse(seconds)?;
    combine_dms(deg, min, sec, negative, axis)
}

fn combine_dms(deg: f64, min: f64, sec: f64, negative: bool, axis: Axis) -> Result<f64, CoordinateFormatError> {
    for (field, value) in [("minutes", min), ("seconds", sec)] {
        if !(0.0..60.0).contains(&value) {
            return Err(CoordinateFormatError::InvalidComponent { field, value });
        }
    }
    let magnitude = deg.abs() + min / 60.0 + sec / 3600.0;
    let sign = if deg.is_sign_negative() || negative { -1.0 } else { 1.0 };
    check_range(sign * magnitude, axis)
}

/// Single-string DMS such as `34°3'8.1"N`, `34 3 8.1 N` or `-118d14m37.2`.
pub fn parse_dms(text: &str, axis: Axis) -> Result<f64, CoordinateFormatError> {
    if text.trim().is_empty() {
        return Err(CoordinateFormatError::Empty);
    }
    let invalid = || CoordinateFormatError::InvalidDms(text.trim().to_string());

    let mut hemisphere: Option<char> = None;
    let mut numbers: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in text.trim().chars() {
        if c.is_ascii_digit() || c == '.' || (c == '-' && current.is_empty() && numbers.is_empty()) {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            numbers.push(std::mem::take(&mut current));
        }
        match c.to_ascii_uppercase() {
            'N' | 'S' | 'E' | 'W' if hemisphere.is_none() => hemisphere = Some(c.to_ascii_uppercase()),
            'D' | 'M' | '°' | '\'' | '"' | '′' | '″' | ' ' | ',' | ':' => {}
            _ => return Err(invalid()),
        }
    }
    if !current.is_empty() {
        numbers.push(current);
    }
    if numbers.is_empty() || numbers.len() > 3 {
        return Err(invalid());
    }

    let mut values = [0.0; 3];
    for (slot, number) in values.iter_mut().zip(&numbers) {
        *slot = number.parse().map_err(|_| invalid())?;
    }

    let negative = match hemisphere {
        None => false,
        Some(h) => {
            let (positive, negative) = axis.hemispheres();
            if h == negative {
                true
            } else if h == positive {
                false
            } else {
                return Err(CoordinateFormatError::WrongHemisphere { axis, found: h });
            }
        }
    };
    combine_dms(values[0], values[1], values[2], negative, axis)
}

/// Degrees/minutes/seconds split of a decimal value, seconds rounded to
/// hundredths with carries applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
    pub hemisphere: char,
}

impl Dms {
    pub fn from_decimal(value: f64, axis: Axis) -> Self {
        let (positive, negative) = axis.hemispheres();
        let hundredths = (value.abs() * 360_000.0).round() as u64;
        Self {
            degrees: (hundredths / 360_000) as u32,
            minutes: ((hundredths / 6_000) % 60) as u32,
            seconds: (hundredths % 6_000) as f64 / 100.0,
            hemisphere: if value < 0.0 && hundredths > 0 { negative } else { positive },
        }
    }

    pub fn to_decimal(&self) -> f64 {
        let magnitude = self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0;
        if matches!(self.hemisphere, 'S' | 'W') { -magnitude } else { magnitude }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}° {}' {:.2}\" {}",
            self.degrees, self.minutes, self.seconds, self.hemisphere
        )
    }
}

pub fn format_dms(value: f64, axis: Axis) -> String {
    Dms::from_decimal(value, axis).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_degrees_with_and_without_hemisphere() {
        assert_eq!(parse_decimal_degrees("34.05", Axis::Latitude), Ok(34.05));
        assert_eq!(parse_decimal_degrees(" -118.25 ", Axis::Longitude), Ok(-118.25));
        assert_eq!(parse_decimal_degrees("34.05S", Axis::Latitude), Ok(-34.05));
        assert_eq!(parse_decimal_degrees("W 118.25", Axis::Longitude), Ok(-118.25));
        assert_eq!(parse_decimal_degrees("12.5°e", Axis::Longitude), Ok(12.5));
    }

    #[test]
    fn decimal_degrees_errors() {
        assert_eq!(parse_decimal_degrees("  ", Axis::Latitude), Err(CoordinateFormatError::Empty));
        assert!(matches!(
            parse_decimal_degrees("91", Axis::Latitude),
            Err(CoordinateFormatError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_decimal_degrees("12E", Axis::Latitude),
            Err(CoordinateFormatError::WrongHemisphere { found: 'E', .. })
        ));
        assert!(matches!(
            parse_decimal_degrees("abc1", Axis::Latitude),
            Err(CoordinateFormatError::WrongHemisphere { .. }) | Err(CoordinateFormatError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_decimal_degrees("-5S", Axis::Latitude),
            Err(CoordinateFormatError::InvalidNumber(_))
        ));
    }

    #[test]
    fn coordinate_pair() {
        let c = parse_coordinate_pair("45.5", "-73.6").unwrap();
        assert_eq!(c, Coordinate::new(45.5, -73.6));
        assert!(parse_coordinate_pair("", "1").is_err());
    }

    #[test]
    fn dms_components() {
        let v = dms_components_to_decimal("34", "3", "8.1", false, Axis::Latitude).unwrap();
        assert!((v - 34.052_25).abs() < 1e-9);
        let w = dms_components_to_decimal("118", "15", "", true, Axis::Longitude).unwrap();
        assert_eq!(w, -118.25);
        let neg = dms_components_to_decimal("-118", "15", "0", false, Axis::Longitude).unwrap();
        assert_eq!(neg, -118.25);
        assert!(matches!(
            dms_components_to_decimal("10", "60", "0", false, Axis::Latitude),
            Err(CoordinateFormatError::InvalidComponent { field: "minutes", .. })
        ));
    }

    #[test]
    fn dms_single_string() {
        let v = parse_dms("34°3'8.1\"N", Axis::Latitude).unwrap();
        assert!((v - 34.052_25).abs() < 1e-9);
        let w = parse_dms("118 14 37.2 W", Axis::Longitude).unwrap();
        assert!((w + 118.243_666_666).abs() < 1e-6);
        let d = parse_dms("-118d15m", Axis::Longitude).unwrap();
        assert_eq!(d, -118.25);
        assert!(parse_dms("34x3", Axis::Latitude).is_err());
        assert!(parse_dms("1 2 3 4", Axis::Latitude).is_err());
        assert!(matches!(
            parse_dms("34 3 8 E", Axis::Latitude),
            Err(CoordinateFormatError::WrongHemisphere { .. })
        ));
    }

    #[test]
    fn dms_formatting_carries_rounding() {
        assert_eq!(format_dms(34.052_25, Axis::Latitude), "34° 3' 8.10\" N");
        assert_eq!(format_dms(-118.25, Axis::Longitude), "118° 15' 0.00\" W");
        // 59.999.. seconds rounds up into the next minute
        assert_eq!(format_dms(10.999_999_9, Axis::Latitude), "11° 0' 0.00\" N");
    }

    #[test]
    fn dms_round_trip() {
        let dms = Dms::from_decimal(-33.868_8, Axis::Latitude);
        assert_eq!(dms.hemisphere, 'S');
        assert!((dms.to_decimal() + 33.868_8).abs() < 1e-5);
    }
}
