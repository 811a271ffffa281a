//! In-memory backend for testing.
//!
//! [`MockSession`] implements [`Session`] without a cluster. It hands back a
//! configured set of [`MockRow`]s for every statement and records the
//! statements it was given, so tests can check both the composed query and
//! the mapped readings.
//!
//! # Features
//!
//! - **Statement capture**: every executed statement is kept in order
//! - **Limit emulation**: the trailing `LIMIT n` truncates the returned rows
//! - **Failure injection**: fail every call, or only the next N calls
//!
//! # Example
//!
//! ```
//! use fleet_store::mock::{MockRow, MockSession};
//! use fleet_store::ReadingRepository;
//! use fleet_types::GeoPoint;
//! use time::macros::datetime;
//!
//! let session = MockSession::with_rows(vec![
//!     MockRow::new("V42", datetime!(2024-01-01 10:00:00 UTC), GeoPoint::new(51.5, -0.1)),
//! ]);
//! let repo = ReadingRepository::new(session);
//!
//! let latest = repo.latest_vehicle_reading("V42", None, None, None, false)?;
//! assert_eq!(latest.unwrap().vehicle_id, "V42");
//! assert!(repo.session().last_statement().unwrap().ends_with("LIMIT 1"));
//! # Ok::<(), fleet_store::Error>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use fleet_types::GeoPoint;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::format::{
    DATE_COLUMN, POSITION_COLUMN, PROPERTIES_COLUMN, PROPERTY_PREFIX, SPEED_COLUMN,
    TEMPERATURE_COLUMN, VEHICLE_ID_COLUMN,
};
use crate::session::{Row, Session};

/// A row held in memory, shaped like a telemetry table row.
///
/// Property keys are stored with the `p_` prefix, as the backend does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockRow {
    vehicle_id: Option<String>,
    date: Option<OffsetDateTime>,
    position: Option<GeoPoint>,
    speed: Option<f64>,
    temperature: Option<f64>,
    properties: BTreeMap<String, f64>,
}

impl MockRow {
    /// Create a row with the always-present columns set.
    pub fn new(vehicle_id: &str, date: OffsetDateTime, position: GeoPoint) -> Self {
        Self::default()
            .vehicle_id(vehicle_id)
            .date(date)
            .position(position)
    }

    /// Set the vehicle identifier.
    pub fn vehicle_id(mut self, vehicle_id: &str) -> Self {
        self.vehicle_id = Some(vehicle_id.to_string());
        self
    }

    /// Set the reading timestamp.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the position point.
    pub fn position(mut self, position: GeoPoint) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the speed column.
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Set the temperature column.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Add a dynamic measurement; the storage prefix is added to `name`.
    pub fn property(self, name: &str, value: f64) -> Self {
        self.raw_property(&format!("{PROPERTY_PREFIX}{name}"), value)
    }

    /// Add a dynamic map entry under exactly `key`.
    pub fn raw_property(mut self, key: &str, value: f64) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    fn is_known(column: &str) -> bool {
        [
            VEHICLE_ID_COLUMN,
            DATE_COLUMN,
            POSITION_COLUMN,
            SPEED_COLUMN,
            TEMPERATURE_COLUMN,
            PROPERTIES_COLUMN,
        ]
        .contains(&column)
    }

    fn wrong_column(column: &str, expected: &'static str) -> Error {
        if Self::is_known(column) {
            Error::ColumnType {
                column: column.to_string(),
                expected,
            }
        } else {
            Error::missing(column)
        }
    }
}

impl Row for MockRow {
    fn get_string(&self, column: &str) -> Result<String> {
        match column {
            VEHICLE_ID_COLUMN => self.vehicle_id.clone().ok_or_else(|| Error::missing(column)),
            _ => Err(Self::wrong_column(column, "string")),
        }
    }

    fn get_timestamp(&self, column: &str) -> Result<OffsetDateTime> {
        match column {
            DATE_COLUMN => self.date.ok_or_else(|| Error::missing(column)),
            _ => Err(Self::wrong_column(column, "timestamp")),
        }
    }

    fn get_double(&self, column: &str) -> Result<Option<f64>> {
        match column {
            SPEED_COLUMN => Ok(self.speed),
            TEMPERATURE_COLUMN => Ok(self.temperature),
            _ => Err(Self::wrong_column(column, "double")),
        }
    }

    fn get_point(&self, column: &str) -> Result<GeoPoint> {
        match column {
            POSITION_COLUMN => self.position.ok_or_else(|| Error::missing(column)),
            _ => Err(Self::wrong_column(column, "point")),
        }
    }

    fn get_map(&self, column: &str) -> Result<BTreeMap<String, f64>> {
        match column {
            PROPERTIES_COLUMN => Ok(self.properties.clone()),
            _ => Err(Self::wrong_column(column, "map<text, double>")),
        }
    }
}

/// A session that serves canned rows and records statements.
///
/// Safe to share between threads; all state sits behind a mutex or an
/// atomic.
#[derive(Debug, Default)]
pub struct MockSession {
    rows: Mutex<Vec<MockRow>>,
    statements: Mutex<Vec<String>>,
    should_fail: AtomicBool,
    fail_message: Mutex<String>,
    /// Number of upcoming calls that fail before the session recovers.
    remaining_failures: AtomicU32,
    execute_count: AtomicU32,
}

impl MockSession {
    /// Create a session that returns no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that returns `rows` for every statement.
    pub fn with_rows(rows: Vec<MockRow>) -> Self {
        let session = Self::new();
        session.set_rows(rows);
        session
    }

    /// Replace the rows returned by subsequent calls.
    pub fn set_rows(&self, rows: Vec<MockRow>) {
        if let Ok(mut guard) = self.rows.lock() {
            *guard = rows;
        }
    }

    /// Append one row to the result set.
    pub fn push_row(&self, row: MockRow) {
        if let Ok(mut guard) = self.rows.lock() {
            guard.push(row);
        }
    }

    /// Make every call fail (or succeed again) with an optional message.
    pub fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message
            && let Ok(mut guard) = self.fail_message.lock()
        {
            *guard = msg.to_string();
        }
    }

    /// Fail the next `count` calls, then behave normally.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Statements executed so far, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Most recently executed statement.
    pub fn last_statement(&self) -> Option<String> {
        self.statements
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }

    /// Number of `execute` calls, including failed ones.
    pub fn execute_count(&self) -> u32 {
        self.execute_count.load(Ordering::Relaxed)
    }

    fn failure(&self) -> Option<Error> {
        let transient = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();

        if transient || self.should_fail.load(Ordering::Relaxed) {
            let message = self
                .fail_message
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default();
            let message = if message.is_empty() {
                "Mock failure".to_string()
            } else {
                message
            };
            return Some(Error::backend(std::io::Error::other(message)));
        }
        None
    }
}

/// Parse the trailing `LIMIT n` of a statement.
fn statement_limit(statement: &str) -> Option<usize> {
    statement
        .rsplit_once(" LIMIT ")
        .and_then(|(_, limit)| limit.trim().parse().ok())
}

impl Session for MockSession {
    type Row = MockRow;

    fn execute(&self, statement: &str) -> Result<Vec<MockRow>> {
        self.execute_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.statements.lock() {
            guard.push(statement.to_string());
        }

        if let Some(err) = self.failure() {
            return Err(err);
        }

        let mut rows = self
            .rows
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        if let Some(limit) = statement_limit(statement) {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}
