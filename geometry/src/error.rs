use thiserror::Error;

use crate::{
    buffer::BufferError, config::ConfigError, coordinates::CoordinateFormatError,
    crs::TransformError, edit_buffer::EditBufferError, geojson::GeoJsonError, markup::MarkupError,
    mgrs::MgrsError, well_known_text::WktError,
};

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("coordinate transform failed: {0}")]
    Transform(#[from] TransformError),
    #[error("WKT error: {0}")]
    Wkt(#[from] WktError),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] GeoJsonError),
    #[error("buffer failed: {0}")]
    Buffer(#[from] BufferError),
    #[error("invalid coordinate text: {0}")]
    CoordinateFormat(#[from] CoordinateFormatError),
    #[error("MGRS conversion failed: {0}")]
    Mgrs(#[from] MgrsError),
    #[error("markup edit rejected: {0}")]
    Markup(#[from] MarkupError),
    #[error("edit buffer: {0}")]
    EditBuffer(#[from] EditBufferError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = GeometryError> = std::result::Result<T, E>;
