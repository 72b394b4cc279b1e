//! MGRS grid references on the WGS84 lettering scheme.
//!
//! Conversion goes through the UTM zone CRS of the reference, so the
//! projection math stays in PROJ. Polar (UPS) areas are not supported.

use nics_shared::{Coordinate, Vector2};

use crate::{
    coordinates::CoordinateFormatError,
    crs::{self, TransformError},
};

const BANDS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";
const COLUMN_SETS: [&[u8; 8]; 3] = [b"ABCDEFGH", b"JKLMNPQR", b"STUVWXYZ"];
const ROW_LETTERS: &[u8; 20] = b"ABCDEFGHJKLMNPQRSTUV";

/// Smallest UTM northing found in each latitude band, same order as `BANDS`.
const BAND_MIN_NORTHING: [f64; 20] = [
    1_100_000.0, 2_000_000.0, 2_800_000.0, 3_700_000.0, 4_600_000.0, 5_500_000.0,
    6_400_000.0, 7_300_000.0, 8_200_000.0, 9_100_000.0, 0.0, 800_000.0, 1_700_000.0,
    2_600_000.0, 3_500_000.0, 4_400_000.0, 5_300_000.0, 6_200_000.0, 7_000_000.0,
    7_900_000.0,
];

const HUNDRED_KM: f64 = 100_000.0;
const ROW_CYCLE: f64 = 2_000_000.0;

#[derive(Debug, thiserror::Error)]
pub enum MgrsError {
    #[error(transparent)]
    Format(#[from] CoordinateFormatError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// A decoded grid reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridReference {
    pub zone: u8,
    pub band: char,
    pub column: char,
    pub row: char,
    /// Meters east/north inside the 100 km square.
    pub easting: f64,
    pub northing: f64,
    /// Digits per axis, 0..=5.
    pub precision: u8,
}

fn invalid(input: &str, reason: impl Into<String>) -> CoordinateFormatError {
    CoordinateFormatError::InvalidMgrs {
        input: input.to_string(),
        reason: reason.into(),
    }
}

impl GridReference {
    pub fn parse(text: &str) -> Result<Self, CoordinateFormatError> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if compact.is_empty() {
            return Err(CoordinateFormatError::Empty);
        }
        let bytes = compact.as_bytes();

        let zone_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
        if !(1..=2).contains(&zone_len) {
            return Err(invalid(text, "expected a 1-2 digit zone"));
        }
        let zone: u8 = compact[..zone_len]
            .parse()
            .map_err(|_| invalid(text, "bad zone"))?;
        if !(1..=60).contains(&zone) {
            return Err(invalid(text, "zone must be 1-60"));
        }

        let letters = &bytes[zone_len..];
        if letters.len() < 3 || !letters[..3].iter().all(u8::is_ascii_alphabetic) {
            return Err(invalid(text, "expected band and 100 km square letters"));
        }
        let band = letters[0];
        if !BANDS.contains(&band) {
            return Err(invalid(text, format!("unknown latitude band {}", band as char)));
        }

        let digits = &compact[zone_len + 3..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.len() % 2 != 0 || digits.len() > 10 {
            return Err(invalid(text, "expected an even number of up to 10 digits"));
        }
        let precision = (digits.len() / 2) as u8;
        let scale = 10f64.powi(5 - i32::from(precision));
        let axis = |s: &str| -> f64 { s.parse::<f64>().unwrap_or(0.0) * scale };
        let (east, north) = digits.split_at(digits.len() / 2);

        let reference = Self {
            zone,
            band: band as char,
            column: letters[1] as char,
            row: letters[2] as char,
            easting: if east.is_empty() { 0.0 } else { axis(east) },
            northing: if north.is_empty() { 0.0 } else { axis(north) },
            precision,
        };
        reference.utm().map_err(|reason| invalid(text, reason))?;
        Ok(reference)
    }

    fn is_southern(&self) -> bool {
        (self.band as u8) < b'N'
    }

    /// Full UTM easting/northing of the square's south-west corner plus the
    /// in-square offsets.
    pub fn utm(&self) -> Result<Vector2, String> {
        let set = column_set(self.zone);
        let column_index = set
            .iter()
            .position(|&c| c == self.column as u8)
            .ok_or_else(|| format!("column letter {} not used in zone {}", self.column, self.zone))?;
        let easting = (column_index as f64 + 1.0) * HUNDRED_KM + self.easting;

        let row_position = ROW_LETTERS
            .iter()
            .position(|&c| c == self.row as u8)
            .ok_or_else(|| format!("invalid row letter {}", self.row))?;
        let row_index = (row_position + 20 - row_offset(self.zone)) % 20;
        let mut northing = row_index as f64 * HUNDRED_KM + self.northing;

        let band_index = BANDS
            .iter()
            .position(|&b| b == self.band as u8)
            .ok_or_else(|| format!("unknown latitude band {}", self.band))?;
        let min_northing = BAND_MIN_NORTHING[band_index];
        while northing < min_northing {
            northing += ROW_CYCLE;
        }
        Ok(Vector2::new(easting, northing))
    }

    pub fn to_coordinate(&self) -> Result<Coordinate, MgrsError> {
        let utm = self
            .utm()
            .map_err(|reason| invalid(&self.to_string(), reason))?;
        let epsg = crs::utm_epsg(self.zone, self.is_southern())?;
        let geographic = crs::cached_transform(epsg, crs::WGS84)?.apply(utm)?;
        Ok(Coordinate::from(geographic))
    }

    pub fn from_coordinate(coord: Coordinate, precision: u8) -> Result<Self, MgrsError> {
        let precision = precision.min(5);
        if !coord.is_valid_wgs84() || !(-80.0..=84.0).contains(&coord.lat) {
            return Err(CoordinateFormatError::InvalidMgrs {
                input: format!("{}, {}", coord.lat, coord.lon),
                reason: "latitude outside the UTM area (80°S to 84°N)".into(),
            }
            .into());
        }
        let zone = zone_number(coord);
        let band = BANDS[(((coord.lat + 80.0) / 8.0).floor() as usize).min(BANDS.len() - 1)];
        let epsg = crs::utm_epsg(zone, coord.lat < 0.0)?;
        let utm = crs::cached_transform(crs::WGS84, epsg)?.apply(Vector2::from(coord))?;

        let column = ((utm.x / HUNDRED_KM).floor() as i64).clamp(1, 8) as usize - 1;
        let row = ((utm.y / HUNDRED_KM).floor() as i64).rem_euclid(20) as usize;
        let step = 10f64.powi(5 - i32::from(precision));
        let truncate = |v: f64| (v.rem_euclid(HUNDRED_KM) / step).floor() * step;

        Ok(Self {
            zone,
            band: band as char,
            column: column_set(zone)[column] as char,
            row: ROW_LETTERS[(row + row_offset(zone)) % 20] as char,
            easting: truncate(utm.x),
            northing: truncate(utm.y),
            precision,
        })
    }
}

impl std::fmt::Display for GridReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}{}", self.zone, self.band, self.column, self.row)?;
        if self.precision > 0 {
            let divisor = 10f64.powi(5 - i32::from(self.precision));
            let width = usize::from(self.precision);
            write!(
                f,
                "{:0width$}{:0width$}",
                (self.easting / divisor).floor() as u64,
                (self.northing / divisor).floor() as u64,
            )?;
        }
        Ok(())
    }
}

fn column_set(zone: u8) -> &'static [u8; 8] {
    COLUMN_SETS[usize::from(zone - 1) % 3]
}

fn row_offset(zone: u8) -> usize {
    if zone % 2 == 0 { 5 } else { 0 }
}

/// UTM zone number including the Norway and Svalbard exceptions.
pub fn zone_number(coord: Coordinate) -> u8 {
    let lon = if coord.lon >= 180.0 { coord.lon - 360.0 } else { coord.lon };
    let mut zone = (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8;
    if (56.0..64.0).contains(&coord.lat) && (3.0..12.0).contains(&lon) {
        zone = 32;
    }
    if (72.0..=84.0).contains(&coord.lat) {
        zone = match lon {
            l if (0.0..9.0).contains(&l) => 31,
            l if (9.0..21.0).contains(&l) => 33,
            l if (21.0..33.0).contains(&l) => 35,
            l if (33.0..42.0).contains(&l) => 37,
            _ => zone,
        };
    }
    zone
}

pub fn parse_mgrs(text: &str) -> Result<Coordinate, MgrsError> {
    GridReference::parse(text)?.to_coordinate()
}

pub fn to_mgrs(coord: Coordinate, precision: u8) -> Result<String, MgrsError> {
    Ok(GridReference::from_coordinate(coord, precision)?.to_string())
}
