//! Query builder for telemetry searches.
//!
//! [`SearchQuery`] keeps the parts of a search apart (target table,
//! projection, ordered predicate fragments, order, limit) until
//! [`SearchQuery::build`] renders the statement. That lets tests inspect
//! the predicate list directly instead of picking apart a string.
//!
//! # Example
//!
//! ```
//! use fleet_store::SearchQuery;
//! use fleet_types::{Area, GeoPoint, Order};
//!
//! let area = Area::circle(GeoPoint::new(51.5, -0.12), 0.5)?;
//! let query = SearchQuery::new("datastax.vehicle_historical_readings")
//!     .vehicle("V42")
//!     .area(&area)
//!     .filter(Some("speed:[30 TO *]"))
//!     .order(Some(Order::descending()))
//!     .limit(1);
//!
//! assert_eq!(query.predicates.len(), 3);
//! assert!(query.build().ends_with("LIMIT 1"));
//! # Ok::<(), fleet_types::CriteriaError>(())
//! ```

use core::fmt;

use fleet_types::{Area, Order, Timeframe};

use crate::format;

/// Row limit for list operations.
pub const DEFAULT_RESULT_LIMIT: u32 = 100;

/// Row limit for single-reading lookups.
pub const LATEST_LIMIT: u32 = 1;

/// Fluent builder for one composite search statement.
///
/// Predicates are kept in the order they were added. Empty fragments are
/// never stored, so an absent dimension contributes nothing rather than a
/// match-all term.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Fully qualified table (`keyspace.table`).
    pub table: String,
    /// Select the measurement columns as well as the position columns.
    pub measurements: bool,
    /// Predicate fragments, AND-joined in this order.
    pub predicates: Vec<String>,
    /// Sort directive, if any.
    pub order: Option<Order>,
    /// Maximum number of rows.
    pub limit: u32,
}

impl SearchQuery {
    /// Create a query against `table` with no predicates, no order,
    /// position-only projection and the default list limit.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            measurements: false,
            predicates: Vec::new(),
            order: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Choose between position-only and full-measurement projection.
    pub fn measurements(mut self, required: bool) -> Self {
        self.measurements = required;
        self
    }

    /// Append a raw predicate fragment. Empty fragments are ignored.
    pub fn predicate(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        if !fragment.is_empty() {
            self.predicates.push(fragment);
        }
        self
    }

    /// Restrict to one vehicle.
    pub fn vehicle(self, vehicle_id: &str) -> Self {
        self.predicate(format::format_vehicle(vehicle_id))
    }

    /// Restrict to readings positioned inside `area`.
    pub fn area(self, area: &Area) -> Self {
        self.predicate(format::format_area(area))
    }

    /// Restrict to readings taken within `timeframe`.
    pub fn timeframe(self, timeframe: &Timeframe) -> Self {
        self.predicate(format::format_timeframe(timeframe))
    }

    /// Add the caller's filter expression, if there is one.
    pub fn filter(self, filter: Option<&str>) -> Self {
        match filter {
            Some(filter) => self.predicate(format::format_filter(filter)),
            None => self,
        }
    }

    /// Set or clear the sort directive.
    pub fn order(mut self, order: Option<Order>) -> Self {
        self.order = order;
        self
    }

    /// Limit the number of rows returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Render the statement text.
    pub fn build(&self) -> String {
        format::compose_query(
            &self.table,
            &format::format_projection(self.measurements),
            self.predicates.as_slice(),
            &format::format_order(self.order),
            self.limit,
        )
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}
