//! Backend seam: statement execution and typed row access.
//!
//! Connecting to the cluster, pooling and the wire protocol live outside
//! this crate. A driver adapter implements [`Session`] and [`Row`] and hands
//! the session to [`ReadingRepository`](crate::ReadingRepository).
//!
//! Sessions are shared between callers, so implementations must accept
//! concurrent `execute` calls. The repository never locks around them.

use std::collections::BTreeMap;

use fleet_types::GeoPoint;
use time::OffsetDateTime;

use crate::error::Result;

/// Typed accessors over one result row, by column name.
///
/// Accessors for mandatory values return [`Error::MissingColumn`] when the
/// column is null or was not selected. [`Row::get_double`] returns `None`
/// for a null value instead.
///
/// [`Error::MissingColumn`]: crate::Error::MissingColumn
pub trait Row {
    /// Text column.
    fn get_string(&self, column: &str) -> Result<String>;

    /// Timestamp column.
    fn get_timestamp(&self, column: &str) -> Result<OffsetDateTime>;

    /// Nullable double column.
    fn get_double(&self, column: &str) -> Result<Option<f64>>;

    /// Point column, ordinates in backend order.
    fn get_point(&self, column: &str) -> Result<GeoPoint>;

    /// `map<text, double>` column, keys exactly as stored. A null map is
    /// returned as an empty one.
    fn get_map(&self, column: &str) -> Result<BTreeMap<String, f64>>;
}

/// A long-lived connection that executes query statements.
pub trait Session: Send + Sync {
    /// Row type produced by this session.
    type Row: Row;

    /// Execute one statement and return the complete result set.
    ///
    /// Driver failures should be wrapped with [`Error::backend`] so the
    /// original error stays reachable through `source()`.
    ///
    /// [`Error::backend`]: crate::Error::backend
    fn execute(&self, statement: &str) -> Result<Vec<Self::Row>>;
}

impl<S: Session + ?Sized> Session for std::sync::Arc<S> {
    type Row = S::Row;

    fn execute(&self, statement: &str) -> Result<Vec<Self::Row>> {
        (**self).execute(statement)
    }
}
