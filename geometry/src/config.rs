//! Runtime settings: built-in defaults, then an optional JSON file, then
//! `NICS_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nics_shared::UnitSystem;
use serde::{Deserialize, Serialize};

use crate::{circle::DEFAULT_CIRCLE_SEGMENTS, crs};

pub const ENV_UNITS: &str = "NICS_UNITS";
pub const ENV_CIRCLE_SEGMENTS: &str = "NICS_CIRCLE_SEGMENTS";
pub const ENV_UNDO_WINDOW_SECS: &str = "NICS_UNDO_WINDOW_SECS";
pub const ENV_TRANSFORM_CACHE: &str = "NICS_TRANSFORM_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub units: UnitSystem,
    pub circle_segments: usize,
    /// How long a soft-deleted shape can still be restored.
    pub undo_window_secs: u64,
    pub default_epsg: u32,
    pub transform_cache: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            undo_window_secs: 5,
            default_epsg: crs::WGS84,
            transform_cache: crs::DEFAULT_TRANSFORM_CACHE,
        }
    }
}

impl GeometryConfig {
    /// Defaults, overlaid with `path` when given, then with the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loaded geometry config from {}", path.display());
        config.validated()
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_UNITS) {
            self.units = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_UNITS,
                value: value.clone(),
                reason: "expected metric, imperial or nautical".into(),
            })?;
        }
        if let Some(value) = lookup(ENV_CIRCLE_SEGMENTS) {
            self.circle_segments = parse_number(ENV_CIRCLE_SEGMENTS, &value)?;
        }
        if let Some(value) = lookup(ENV_UNDO_WINDOW_SECS) {
            self.undo_window_secs = parse_number(ENV_UNDO_WINDOW_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_TRANSFORM_CACHE) {
            self.transform_cache = parse_number(ENV_TRANSFORM_CACHE, &value)?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.circle_segments < 3 {
            return Err(ConfigError::InvalidValue {
                key: "circle_segments",
                value: self.circle_segments.to_string(),
                reason: "a circle needs at least 3 segments".into(),
            });
        }
        if self.transform_cache == 0 {
            return Err(ConfigError::InvalidValue {
                key: "transform_cache",
                value: "0".into(),
                reason: "cache capacity must be positive".into(),
            });
        }
        crs::lookup(self.default_epsg).map_err(|err| ConfigError::InvalidValue {
            key: "default_epsg",
            value: self.default_epsg.to_string(),
            reason: err.to_string(),
        })?;
        Ok(self)
    }

    pub fn undo_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.undo_window_secs).unwrap_or(i64::MAX))
    }

    /// Resize the calling thread's transform cache to `transform_cache`.
    pub fn apply(&self) {
        crs::set_transform_cache_capacity(self.transform_cache);
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    })
}
