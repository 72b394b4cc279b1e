use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nics_geometry::{
    buffer,
    coordinates::{self, Axis},
    crs, geojson,
    measurement::{self, CardinalDirection},
    mgrs, spherical,
    well_known_text::{self, WktPart},
    GeometryConfig, GeometryKind, UnitSystem, Vector2,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Coordinate transforms, measurement and buffering for map markup"
)]
struct Args {
    /// JSON config file; NICS_* environment variables still override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Unit system for measurements (metric, imperial, nautical)
    #[arg(long, global = true)]
    units: Option<UnitSystem>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a point between two EPSG coordinate systems
    #[command(allow_negative_numbers = true)]
    Transform {
        /// Longitude or easting
        x: f64,
        /// Latitude or northing
        y: f64,
        /// Source EPSG code (defaults to the configured one)
        #[arg(long)]
        from: Option<u32>,
        #[arg(long, default_value_t = crs::WEB_MERCATOR)]
        to: u32,
    },
    /// Distance, area and heading of a WKT geometry in EPSG:4326
    Measure { wkt: String },
    /// Buffer a WKT geometry by a distance in meters
    #[command(allow_negative_numbers = true)]
    Buffer { wkt: String, meters: f64 },
    /// Convert between coordinates and MGRS references
    #[command(subcommand)]
    Mgrs(MgrsCommand),
    /// Print one WKT per shape found in a GeoJSON file
    Geojson { path: PathBuf },
}

#[derive(Debug, Subcommand)]
enum MgrsCommand {
    /// Coordinate to MGRS
    #[command(allow_negative_numbers = true)]
    Encode {
        lat: String,
        lon: String,
        /// Digits per axis, 1 (10 km) to 5 (1 m)
        #[arg(long, default_value_t = 5)]
        precision: u8,
    },
    /// MGRS to coordinate
    Decode { reference: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nics_geometry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = GeometryConfig::load(args.config.as_deref())?;
    if let Some(units) = args.units {
        config.units = units;
    }
    config.apply();
    tracing::debug!("using {config:?}");

    match args.command {
        Command::Transform { x, y, from, to } => {
            let from = from.unwrap_or(config.default_epsg);
            let out = crs::cached_transform(from, to)?.apply(Vector2::new(x, y))?;
            println!("{} {}", out.x, out.y);
        }
        Command::Measure { wkt } => {
            for part in well_known_text::parts_from_wkt(&wkt)? {
                print_measurements(&part, config.units);
            }
        }
        Command::Buffer { wkt, meters } => {
            let outline = buffer::buffer_wkt(&wkt, meters)?;
            println!("{}", outline.to_wkt()?);
        }
        Command::Mgrs(MgrsCommand::Encode { lat, lon, precision }) => {
            let coord = nics_geometry::Coordinate::new(
                coordinates::parse_decimal_degrees(&lat, Axis::Latitude)?,
                coordinates::parse_decimal_degrees(&lon, Axis::Longitude)?,
            );
            println!("{}", mgrs::to_mgrs(coord, precision)?);
        }
        Command::Mgrs(MgrsCommand::Decode { reference }) => {
            let coord = mgrs::parse_mgrs(&reference)?;
            println!(
                "{} {}",
                measurement::format_decimal(coord.lat),
                measurement::format_decimal(coord.lon)
            );
        }
        Command::Geojson { path } => {
            let text = std::fs::read_to_string(&path)?;
            let shapes = geojson::parse_geojson(&text)?;
            tracing::info!("{} shape(s) in {}", shapes.len(), path.display());
            for shape in shapes {
                let wkt = if shape.holes.is_empty() {
                    well_known_text::to_wkt_kind(&shape.coordinates, shape.kind)?
                } else {
                    let rings: Vec<_> = std::iter::once(shape.coordinates.clone())
                        .chain(shape.holes.iter().cloned())
                        .collect();
                    well_known_text::polygons_to_wkt(&[rings])?
                };
                println!("{}\t{wkt}", shape.key);
            }
        }
    }

    Ok(())
}

fn print_measurements(part: &WktPart, units: UnitSystem) {
    let points = &part.coordinates;
    match part.kind {
        GeometryKind::Point => {
            if let Some(p) = points.first() {
                println!(
                    "point: {} {}",
                    coordinates::format_dms(p.lat, Axis::Latitude),
                    coordinates::format_dms(p.lon, Axis::Longitude)
                );
            }
        }
        GeometryKind::LineString => {
            println!("distance: {}", measurement::distance_in(spherical::distance(points), units));
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                let heading = spherical::heading(*first, *last);
                println!(
                    "heading: {} {}",
                    measurement::format_decimal(heading),
                    CardinalDirection::from_heading(heading)
                );
            }
        }
        GeometryKind::Polygon => {
            println!("perimeter: {}", measurement::distance_in(spherical::perimeter(points), units));
            println!("area: {}", measurement::area_in(spherical::area(points), units));
        }
    }
    if let Some(mid) = spherical::midpoint(points) {
        println!(
            "midpoint: {} {}",
            measurement::format_decimal(mid.lat),
            measurement::format_decimal(mid.lon)
        );
    }
}
