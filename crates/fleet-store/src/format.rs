//! Rendering of search criteria into the backend's embedded search language.
//!
//! Every function here is pure and infallible. The fragments are spliced
//! into a statement of the form
//!
//! ```text
//! SELECT <projection> FROM <table> WHERE solr_query = '{"q": "<p1> AND <p2>"<order>}' LIMIT <n>
//! ```
//!
//! Inner double quotes are written JSON-escaped (`\"`) because the search
//! payload is itself a JSON string inside the statement's string literal.

use fleet_types::{Area, GeoPoint, Order, SPEED, TEMPERATURE, Timeframe};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Vehicle identifier column.
pub const VEHICLE_ID_COLUMN: &str = "vehicle_id";
/// Reading timestamp column.
pub const DATE_COLUMN: &str = "date";
/// Point column holding latitude (first ordinate) and longitude (second).
pub const POSITION_COLUMN: &str = "lat_long";
/// First-class speed column.
pub const SPEED_COLUMN: &str = SPEED;
/// First-class temperature column.
pub const TEMPERATURE_COLUMN: &str = TEMPERATURE;
/// Dynamic `map<text, double>` column for open-ended measurements.
pub const PROPERTIES_COLUMN: &str = "p_";
/// Prefix carried by every key of the dynamic map in storage.
pub const PROPERTY_PREFIX: &str = "p_";

/// Spatial predicate: the reading position lies within the area.
pub fn format_area(area: &Area) -> String {
    let shape = match area {
        Area::Circle { center, radius } => format!("BUFFER(POINT({center}), {radius})"),
        _ => format!("POLYGON(({}))", format_ring(&area.ring())),
    };
    format!(r#"{POSITION_COLUMN}:\"IsWithin({shape})\""#)
}

fn format_ring(ring: &[GeoPoint]) -> String {
    ring.iter()
        .map(GeoPoint::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Range predicate on the reading timestamp. Open bounds render as `*`.
pub fn format_timeframe(timeframe: &Timeframe) -> String {
    let start = timeframe.start.map_or_else(|| "*".to_string(), format_instant);
    let end = timeframe.end.map_or_else(|| "*".to_string(), format_instant);
    let close = if timeframe.end_inclusive || timeframe.end.is_none() {
        ']'
    } else {
        '}'
    };
    format!("{DATE_COLUMN}:[{start} TO {end}{close}")
}

/// Search-engine date literal, always in UTC with millisecond precision.
pub fn format_instant(instant: OffsetDateTime) -> String {
    // Writing into a String cannot fail and every component is present.
    instant
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .unwrap_or_default()
}

/// Caller-supplied predicate, embedded verbatim.
///
/// No escaping or validation happens here. Text containing `'` ends the
/// statement's string literal early, and `"` or `}` can break out of the
/// search payload. Callers that take filters from untrusted input should
/// enable `reject_unsafe_filters` in the query configuration or sanitize
/// before calling.
pub fn format_filter(filter: &str) -> String {
    filter.to_string()
}

/// Exact-match predicate on the vehicle identifier.
///
/// The identifier is embedded verbatim, with the same caveats as
/// [`format_filter`].
pub fn format_vehicle(vehicle_id: &str) -> String {
    format!("{VEHICLE_ID_COLUMN}:{vehicle_id}")
}

/// Sort clause on the reading timestamp, or the empty string when absent.
pub fn format_order(order: Option<Order>) -> String {
    match order {
        Some(order) => format!(r#", "sort": "{DATE_COLUMN} {}""#, order.direction()),
        None => String::new(),
    }
}

/// Selected columns: position only, or position plus every measurement.
pub fn format_projection(measurements_required: bool) -> String {
    let mut columns = vec![VEHICLE_ID_COLUMN, DATE_COLUMN, POSITION_COLUMN];
    if measurements_required {
        columns.extend([SPEED_COLUMN, TEMPERATURE_COLUMN, PROPERTIES_COLUMN]);
    }
    columns.join(", ")
}

/// Returns `true` if the text would terminate the statement literal.
/// Applies to filters and vehicle ids alike.
pub fn filter_escapes_literal(filter: &str) -> bool {
    filter.contains('\'')
}

/// Assemble the composite statement.
///
/// Predicates are AND-joined in the order given; empty fragments are
/// skipped, nothing is reordered or deduplicated. `order` is spliced in
/// after the predicate string and before the payload closes; `limit` goes
/// after the payload.
pub fn compose_query<P: AsRef<str>>(
    table: &str,
    projection: &str,
    predicates: &[P],
    order: &str,
    limit: u32,
) -> String {
    let payload = predicates
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        r#"SELECT {projection} FROM {table} WHERE solr_query = '{{"q": "{payload}"{order}}}' LIMIT {limit}"#
    )
}
