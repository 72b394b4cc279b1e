//! Values mirrored between a text field and a map marker.
//!
//! Each value carries the source of its last update so the side that
//! produced it does not echo it back.

use chrono::{DateTime, Utc};
use nics_shared::Coordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinates::{self, CoordinateFormatError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateTrigger {
    /// Typed into a coordinate field.
    Input,
    /// Dragged or tapped on the map.
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancedLatLng {
    pub id: Uuid,
    pub coordinate: Coordinate,
    pub trigger: UpdateTrigger,
}

impl EnhancedLatLng {
    pub fn new(coordinate: Coordinate, trigger: UpdateTrigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinate,
            trigger,
        }
    }

    /// Parse latitude/longitude text fields into an input-triggered value.
    pub fn from_input(lat: &str, lon: &str) -> Result<Self, CoordinateFormatError> {
        let coordinate = coordinates::parse_coordinate_pair(lat, lon)?;
        Ok(Self::new(coordinate, UpdateTrigger::Input))
    }

    /// Same identity, new position and source.
    pub fn moved(&self, coordinate: Coordinate, trigger: UpdateTrigger) -> Self {
        Self {
            id: self.id,
            coordinate,
            trigger,
        }
    }
}

/// A device or user location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancedLocation {
    pub id: Uuid,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing_deg: Option<f32>,
    pub timestamp: DateTime<Utc>,
    pub trigger: UpdateTrigger,
}

impl EnhancedLocation {
    pub fn new(coordinate: Coordinate, trigger: UpdateTrigger, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinate,
            accuracy_m: None,
            altitude_m: None,
            bearing_deg: None,
            timestamp,
            trigger,
        }
    }

    pub fn lat_lng(&self) -> EnhancedLatLng {
        EnhancedLatLng {
            id: self.id,
            coordinate: self.coordinate,
            trigger: self.trigger,
        }
    }
}

/// Latest value plus the trigger that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceCell<T> {
    value: Option<T>,
    trigger: Option<UpdateTrigger>,
    revision: u64,
}

impl<T> Default for ProvenanceCell<T> {
    fn default() -> Self {
        Self {
            value: None,
            trigger: None,
            revision: 0,
        }
    }
}

impl<T> ProvenanceCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and return the new revision number.
    pub fn set(&mut self, value: T, trigger: UpdateTrigger) -> u64 {
        self.value = Some(value);
        self.trigger = Some(trigger);
        self.revision += 1;
        self.revision
    }

    /// Clear the value, e.g. after the text field failed to parse.
    pub fn clear(&mut self, trigger: UpdateTrigger) {
        self.value = None;
        self.trigger = Some(trigger);
        self.revision += 1;
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn trigger(&self) -> Option<UpdateTrigger> {
        self.trigger
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when `consumer` did not produce the current state and so
    /// should apply it.
    pub fn should_propagate(&self, consumer: UpdateTrigger) -> bool {
        self.trigger.is_some_and(|trigger| trigger != consumer)
    }

    /// The value for `consumer`, or `None` when it originated there.
    pub fn value_for(&self, consumer: UpdateTrigger) -> Option<&T> {
        if self.should_propagate(consumer) {
            self.value.as_ref()
        } else {
            None
        }
    }
}
