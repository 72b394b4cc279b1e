pub mod buffer;
pub mod circle;
pub mod config;
pub mod coordinates;
pub mod crs;
pub mod diff;
pub mod edit_buffer;
pub mod error;
pub mod geojson;
pub mod markup;
pub mod measurement;
pub mod mgrs;
pub mod nearest;
pub mod provenance;
pub mod spherical;
pub mod well_known_text;

pub use nics_shared::{
    Coordinate, DashStyle, GeometryKind, MarkupStyle, MarkupType, SendStatus, UnitSystem, Vector2,
};

pub use crate::config::GeometryConfig;
pub use crate::error::{GeometryError, Result};
pub use crate::markup::MarkupShape;
