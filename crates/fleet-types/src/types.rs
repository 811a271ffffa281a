//! Telemetry readings returned by searches.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::criteria::GeoPoint;

/// Name of the first-class speed measurement.
pub const SPEED: &str = "speed";

/// Name of the first-class temperature measurement.
pub const TEMPERATURE: &str = "temperature";

/// Named measurement values attached to a reading.
///
/// Names are unique. Entries keep the order in which they were inserted,
/// so the first-class measurements come before the dynamic ones when a
/// reading is built from a row. Inserting an existing name replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements {
    entries: Vec<(String, f64)>,
}

impl Measurements {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a measurement, returning the previous value under that name.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Value of a measurement, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Returns `true` if a measurement with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Number of measurements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no measurements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Measurement names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut measurements = Measurements::new();
        measurements.extend(iter);
        measurements
    }
}

impl<K: Into<String>> Extend<(K, f64)> for Measurements {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl IntoIterator for Measurements {
    type Item = (String, f64);
    type IntoIter = std::vec::IntoIter<(String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// Serialized as a map so JSON output reads `{"speed": 42.0, ...}`.
#[cfg(feature = "serde")]
impl Serialize for Measurements {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Measurements {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MeasurementsVisitor;

        impl<'de> serde::de::Visitor<'de> for MeasurementsVisitor {
            type Value = Measurements;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of measurement names to numbers")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut measurements = Measurements::new();
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    measurements.insert(name, value);
                }
                Ok(measurements)
            }
        }

        deserializer.deserialize_map(MeasurementsVisitor)
    }
}

/// A single telemetry reading for one vehicle.
///
/// Identifier, timestamp and position are always set. The measurement set
/// is only filled when the search asked for measurements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleReading {
    /// Vehicle identifier.
    pub vehicle_id: String,
    /// When the reading was taken.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Named measurement values.
    #[cfg_attr(feature = "serde", serde(default))]
    pub measurements: Measurements,
}

impl VehicleReading {
    /// Create a reading with an empty measurement set.
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>,
        timestamp: OffsetDateTime,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            latitude,
            longitude,
            measurements: Measurements::new(),
        }
    }

    /// Create a reading from a stored position.
    ///
    /// The point's first ordinate becomes the latitude and its second the
    /// longitude, following the storage convention described on
    /// [`GeoPoint`].
    #[must_use]
    pub fn at_position(
        vehicle_id: impl Into<String>,
        timestamp: OffsetDateTime,
        position: GeoPoint,
    ) -> Self {
        Self::new(vehicle_id, timestamp, position.x, position.y)
    }

    /// Add or replace a measurement.
    pub fn add_measurement(&mut self, name: impl Into<String>, value: f64) {
        self.measurements.insert(name, value);
    }

    /// Speed, if it was requested and stored.
    #[must_use]
    pub fn speed(&self) -> Option<f64> {
        self.measurements.get(SPEED)
    }

    /// Temperature, if it was requested and stored.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.measurements.get(TEMPERATURE)
    }
}

impl fmt::Display for VehicleReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}, {})",
            self.vehicle_id, self.timestamp, self.latitude, self.longitude
        )?;
        for (name, value) in self.measurements.iter() {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}
