//! Projection of backend rows into readings.

use fleet_types::{SPEED, TEMPERATURE, VehicleReading};
use tracing::debug;

use crate::error::Result;
use crate::format::{
    DATE_COLUMN, POSITION_COLUMN, PROPERTIES_COLUMN, PROPERTY_PREFIX, SPEED_COLUMN,
    TEMPERATURE_COLUMN, VEHICLE_ID_COLUMN,
};
use crate::session::Row;

/// Build a reading from one row.
///
/// Identifier, timestamp and position are always read. The point's first
/// ordinate becomes the latitude and the second the longitude.
///
/// With `measurements_required`, speed and temperature are added first
/// (skipped when null), then every entry of the dynamic map with its
/// storage prefix removed. Without it the measurement columns are not
/// touched at all.
pub fn read_reading<R: Row + ?Sized>(row: &R, measurements_required: bool) -> Result<VehicleReading> {
    let vehicle_id = row.get_string(VEHICLE_ID_COLUMN)?;
    let timestamp = row.get_timestamp(DATE_COLUMN)?;
    let position = row.get_point(POSITION_COLUMN)?;

    let mut reading = VehicleReading::at_position(vehicle_id, timestamp, position);

    if measurements_required {
        if let Some(speed) = row.get_double(SPEED_COLUMN)? {
            reading.add_measurement(SPEED, speed);
        }
        if let Some(temperature) = row.get_double(TEMPERATURE_COLUMN)? {
            reading.add_measurement(TEMPERATURE, temperature);
        }
        for (key, value) in row.get_map(PROPERTIES_COLUMN)? {
            reading.add_measurement(strip_property_prefix(key), value);
        }
    }

    Ok(reading)
}

/// Map an optional row. `None` means the backend returned nothing and
/// yields `Ok(None)`, not an error.
pub fn map_row<R: Row>(row: Option<&R>, measurements_required: bool) -> Result<Option<VehicleReading>> {
    match row {
        Some(row) => read_reading(row, measurements_required).map(Some),
        None => {
            debug!("Null row, returning no reading");
            Ok(None)
        }
    }
}

/// Map a complete result set. Fails on the first row that cannot be read.
pub fn map_rows<R: Row>(rows: &[R], measurements_required: bool) -> Result<Vec<VehicleReading>> {
    rows.iter()
        .map(|row| read_reading(row, measurements_required))
        .collect()
}

fn strip_property_prefix(key: String) -> String {
    if key.len() > PROPERTY_PREFIX.len() && key.starts_with(PROPERTY_PREFIX) {
        key[PROPERTY_PREFIX.len()..].to_string()
    } else {
        key
    }
}
