//! Reading repository: builds a search per operation, runs it, maps rows.

use fleet_types::{Area, Order, Timeframe, VehicleReading};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format;
use crate::mapper;
use crate::queries::{LATEST_LIMIT, SearchQuery};
use crate::session::Session;

/// Read access to vehicle telemetry over a shared backend session.
///
/// Every operation issues exactly one statement, waits for the complete
/// result set and maps it. Backend failures are returned as
/// [`Error::Backend`] without retrying. Empty results are `Ok`.
///
/// The session is fixed at construction. Wrap it in an `Arc` to share one
/// connection between several repositories or threads.
pub struct ReadingRepository<S> {
    session: S,
    current_table: String,
    historical_table: String,
    result_limit: u32,
    reject_unsafe_filters: bool,
}

impl<S: Session> ReadingRepository<S> {
    /// Create a repository with the default configuration.
    pub fn new(session: S) -> Self {
        Self::with_config(session, &Config::default())
    }

    /// Create a repository using the given table names and query settings.
    pub fn with_config(session: S, config: &Config) -> Self {
        Self {
            session,
            current_table: config.backend.current_table_name(),
            historical_table: config.backend.historical_table_name(),
            result_limit: config.queries.result_limit,
            reject_unsafe_filters: config.queries.reject_unsafe_filters,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    fn check_filter(&self, filter: Option<&str>) -> Result<()> {
        match filter {
            Some(text) if self.reject_unsafe_filters && format::filter_escapes_literal(text) => {
                Err(Error::UnsafeFilter(text.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_vehicle_id(&self, vehicle_id: &str) -> Result<()> {
        if self.reject_unsafe_filters && format::filter_escapes_literal(vehicle_id) {
            return Err(Error::UnsafeVehicleId(vehicle_id.to_string()));
        }
        Ok(())
    }

    fn fetch(&self, operation: &'static str, query: &SearchQuery) -> Result<Vec<S::Row>> {
        let statement = query.build();
        debug!(operation, query = %statement, "Executing query");

        self.session.execute(&statement).inspect_err(|e| {
            warn!(operation, error = %e, "Query failed");
        })
    }
}

// Query construction
impl<S: Session> ReadingRepository<S> {
    /// Query for [`current_readings_by_area`](Self::current_readings_by_area).
    ///
    /// Predicates: area, then filter.
    pub fn current_readings_query(
        &self,
        area: &Area,
        filter: Option<&str>,
        measurements_required: bool,
    ) -> Result<SearchQuery> {
        self.check_filter(filter)?;

        Ok(SearchQuery::new(&self.current_table)
            .measurements(measurements_required)
            .area(area)
            .filter(filter)
            .limit(self.result_limit))
    }

    /// Query for [`historical_readings_by_area`](Self::historical_readings_by_area).
    ///
    /// Predicates: area, timeframe, then filter. The caller's order is used
    /// as given.
    pub fn historical_area_query(
        &self,
        area: &Area,
        timeframe: &Timeframe,
        filter: Option<&str>,
        order: Option<Order>,
        measurements_required: bool,
    ) -> Result<SearchQuery> {
        self.check_filter(filter)?;

        Ok(SearchQuery::new(&self.historical_table)
            .measurements(measurements_required)
            .area(area)
            .timeframe(timeframe)
            .filter(filter)
            .order(order)
            .limit(self.result_limit))
    }

    /// Query for [`latest_vehicle_reading`](Self::latest_vehicle_reading).
    ///
    /// Predicates: vehicle, area, timeframe, then filter. Always newest
    /// first with a limit of one.
    pub fn latest_vehicle_query(
        &self,
        vehicle_id: &str,
        area: Option<&Area>,
        timeframe: Option<&Timeframe>,
        filter: Option<&str>,
        measurements_required: bool,
    ) -> Result<SearchQuery> {
        Ok(self
            .vehicle_query(vehicle_id, area, timeframe, filter, measurements_required)?
            .order(Some(Order::descending()))
            .limit(LATEST_LIMIT))
    }

    /// Query for [`historical_vehicle_readings`](Self::historical_vehicle_readings).
    ///
    /// Predicates: vehicle, area, timeframe, then filter. When the caller
    /// passes any order, the statement sorts oldest first; the order's own
    /// direction is not consulted. Without an order no sort clause is sent.
    pub fn historical_vehicle_query(
        &self,
        vehicle_id: &str,
        area: Option<&Area>,
        timeframe: Option<&Timeframe>,
        filter: Option<&str>,
        order: Option<Order>,
        measurements_required: bool,
    ) -> Result<SearchQuery> {
        // Any order sorts oldest first here; only the area variant honours
        // the direction.
        let order = order.map(|_| Order::ascending());

        Ok(self
            .vehicle_query(vehicle_id, area, timeframe, filter, measurements_required)?
            .order(order)
            .limit(self.result_limit))
    }

    fn vehicle_query(
        &self,
        vehicle_id: &str,
        area: Option<&Area>,
        timeframe: Option<&Timeframe>,
        filter: Option<&str>,
        measurements_required: bool,
    ) -> Result<SearchQuery> {
        self.check_vehicle_id(vehicle_id)?;
        self.check_filter(filter)?;

        let mut query = SearchQuery::new(&self.historical_table)
            .measurements(measurements_required)
            .vehicle(vehicle_id);
        if let Some(area) = area {
            query = query.area(area);
        }
        if let Some(timeframe) = timeframe {
            query = query.timeframe(timeframe);
        }
        Ok(query.filter(filter))
    }
}

// Read operations
impl<S: Session> ReadingRepository<S> {
    /// Latest known reading of every vehicle currently inside `area`.
    pub fn current_readings_by_area(
        &self,
        area: &Area,
        filter: Option<&str>,
        measurements_required: bool,
    ) -> Result<Vec<VehicleReading>> {
        let query = self.current_readings_query(area, filter, measurements_required)?;
        let rows = self.fetch("current_readings_by_area", &query)?;
        mapper::map_rows(&rows, measurements_required)
    }

    /// Readings taken inside `area` during `timeframe`.
    pub fn historical_readings_by_area(
        &self,
        area: &Area,
        timeframe: &Timeframe,
        filter: Option<&str>,
        order: Option<Order>,
        measurements_required: bool,
    ) -> Result<Vec<VehicleReading>> {
        let query =
            self.historical_area_query(area, timeframe, filter, order, measurements_required)?;
        let rows = self.fetch("historical_readings_by_area", &query)?;
        mapper::map_rows(&rows, measurements_required)
    }

    /// Most recent reading of one vehicle matching the optional criteria.
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub fn latest_vehicle_reading(
        &self,
        vehicle_id: &str,
        area: Option<&Area>,
        timeframe: Option<&Timeframe>,
        filter: Option<&str>,
        measurements_required: bool,
    ) -> Result<Option<VehicleReading>> {
        let query =
            self.latest_vehicle_query(vehicle_id, area, timeframe, filter, measurements_required)?;
        let rows = self.fetch("latest_vehicle_reading", &query)?;
        mapper::map_row(rows.first(), measurements_required)
    }

    /// Reading history of one vehicle matching the optional criteria.
    pub fn historical_vehicle_readings(
        &self,
        vehicle_id: &str,
        area: Option<&Area>,
        timeframe: Option<&Timeframe>,
        filter: Option<&str>,
        order: Option<Order>,
        measurements_required: bool,
    ) -> Result<Vec<VehicleReading>> {
        let query = self.historical_vehicle_query(
            vehicle_id,
            area,
            timeframe,
            filter,
            order,
            measurements_required,
        )?;
        let rows = self.fetch("historical_vehicle_readings", &query)?;
        mapper::map_rows(&rows, measurements_required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::mock::{MockRow, MockSession};
    use crate::queries::DEFAULT_RESULT_LIMIT;
    use fleet_types::GeoPoint;
    use proptest::prelude::*;
    use time::macros::datetime;

    fn test_area() -> Area {
        Area::bounding_box(GeoPoint::new(48.0, 2.0), GeoPoint::new(49.0, 3.0)).unwrap()
    }

    fn test_timeframe() -> Timeframe {
        Timeframe::between(
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-02 00:00:00 UTC),
        )
        .unwrap()
    }

    fn repo() -> ReadingRepository<MockSession> {
        ReadingRepository::new(MockSession::new())
    }

    #[test]
    fn test_current_query_area_only() {
        let area = test_area();
        let query = repo().current_readings_query(&area, None, false).unwrap();

        assert_eq!(query.table, "datastax.vehicle_current_reading");
        assert_eq!(query.predicates, vec![format::format_area(&area)]);
        assert!(!query.measurements);
        assert_eq!(query.order, None);
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn test_current_query_area_then_filter() {
        let area = test_area();
        let query = repo()
            .current_readings_query(&area, Some("speed:[30 TO *]"), true)
            .unwrap();

        assert_eq!(query.predicates.len(), 2);
        assert_eq!(query.predicates[1], "speed:[30 TO *]");
        assert!(query.build().contains(" AND speed:[30 TO *]\"}'"));
    }

    #[test]
    fn test_historical_area_query_honours_order_direction() {
        let area = test_area();
        let tf = test_timeframe();
        let r = repo();

        let desc = r
            .historical_area_query(&area, &tf, None, Some(Order::descending()), false)
            .unwrap();
        assert_eq!(desc.order, Some(Order::descending()));

        let asc = r
            .historical_area_query(&area, &tf, None, Some(Order::ascending()), false)
            .unwrap();
        assert_eq!(asc.order, Some(Order::ascending()));

        let none = r.historical_area_query(&area, &tf, None, None, false).unwrap();
        assert_eq!(none.order, None);
        assert_eq!(none.table, "datastax.vehicle_historical_readings");
        assert_eq!(none.predicates.len(), 2);
        assert!(none.predicates[1].starts_with("date:["));
    }

    #[test]
    fn test_latest_query_forces_descending_and_limit_one() {
        let query = repo()
            .latest_vehicle_query("V42", None, None, Some("speed>30"), false)
            .unwrap();

        assert_eq!(query.predicates, vec!["vehicle_id:V42", "speed>30"]);
        assert_eq!(query.order, Some(Order::descending()));
        assert_eq!(query.limit, 1);
        assert_eq!(
            query.build(),
            r#"SELECT vehicle_id, date, lat_long FROM datastax.vehicle_historical_readings WHERE solr_query = '{"q": "vehicle_id:V42 AND speed>30", "sort": "date desc"}' LIMIT 1"#
        );
    }

    #[test]
    fn test_historical_vehicle_query_overrides_order_to_ascending() {
        let r = repo();

        let query = r
            .historical_vehicle_query("V1", None, None, None, Some(Order::descending()), false)
            .unwrap();
        assert_eq!(query.order, Some(Order::ascending()));
        assert!(query.build().contains(r#""sort": "date asc""#));

        let query = r
            .historical_vehicle_query("V1", None, None, None, None, false)
            .unwrap();
        assert_eq!(query.order, None);
        assert!(!query.build().contains("sort"));
    }

    #[test]
    fn test_vehicle_query_predicate_order() {
        let area = test_area();
        let tf = test_timeframe();
        let query = repo()
            .historical_vehicle_query("V1", Some(&area), Some(&tf), Some("fuel:[0 TO 0.1]"), None, true)
            .unwrap();

        assert_eq!(
            query.predicates,
            vec![
                "vehicle_id:V1".to_string(),
                format::format_area(&area),
                format::format_timeframe(&tf),
                "fuel:[0 TO 0.1]".to_string(),
            ]
        );
        assert!(query.measurements);
    }

    #[test]
    fn test_config_controls_tables_and_limit() {
        let mut config = Config::default();
        config.backend.keyspace = "fleet".to_string();
        config.queries = QueryConfig {
            result_limit: 25,
            ..QueryConfig::default()
        };
        let r = ReadingRepository::with_config(MockSession::new(), &config);

        let area = test_area();
        let query = r.current_readings_query(&area, None, false).unwrap();
        assert_eq!(query.table, "fleet.vehicle_current_reading");
        assert_eq!(query.limit, 25);

        let latest = r.latest_vehicle_query("V1", None, None, None, false).unwrap();
        assert_eq!(latest.limit, 1);
    }

    #[test]
    fn test_unsafe_filter_passes_through_by_default() {
        let area = test_area();
        let query = repo()
            .current_readings_query(&area, Some("name:'x'"), false)
            .unwrap();
        assert!(query.build().contains("name:'x'"));
    }

    #[test]
    fn test_unsafe_filter_rejected_when_enabled() {
        let mut config = Config::default();
        config.queries.reject_unsafe_filters = true;
        let r = ReadingRepository::with_config(MockSession::new(), &config);

        let area = test_area();
        let err = r
            .current_readings_by_area(&area, Some("x' OR '1'='1"), false)
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeFilter(_)));
        assert_eq!(r.session().execute_count(), 0);
    }

    #[test]
    fn test_unsafe_vehicle_id_rejected_when_enabled() {
        let mut config = Config::default();
        config.queries.reject_unsafe_filters = true;
        let r = ReadingRepository::with_config(MockSession::new(), &config);

        let err = r
            .latest_vehicle_reading("V1' OR '1'='1", None, None, None, false)
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeVehicleId(_)));

        let err = r
            .historical_vehicle_readings("V1'", None, None, None, None, false)
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeVehicleId(_)));
        assert_eq!(r.session().execute_count(), 0);
    }

    #[test]
    fn test_unsafe_vehicle_id_passes_through_by_default() {
        let query = repo()
            .latest_vehicle_query("V1'", None, None, None, false)
            .unwrap();
        assert_eq!(query.predicates, vec!["vehicle_id:V1'"]);
    }

    #[test]
    fn test_whitespace_filter_is_kept() {
        let area = test_area();
        let query = repo()
            .current_readings_query(&area, Some(" "), false)
            .unwrap();
        assert_eq!(query.predicates, vec![format::format_area(&area), " ".to_string()]);
    }

    #[test]
    fn test_current_readings_maps_rows() {
        let session = MockSession::with_rows(vec![
            MockRow::new("V1", datetime!(2024-01-01 10:00:00 UTC), GeoPoint::new(48.5, 2.5))
                .speed(30.0),
        ]);
        let r = ReadingRepository::new(session);

        let readings = r.current_readings_by_area(&test_area(), None, false).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].latitude, 48.5);
        assert!(readings[0].measurements.is_empty());
    }

    #[test]
    fn test_latest_reading_absent() {
        let r = repo();
        let latest = r.latest_vehicle_reading("V9", None, None, None, true).unwrap();
        assert!(latest.is_none());
    }

    #[test]
    fn test_backend_failure_propagates() {
        let r = repo();
        r.session().set_should_fail(true, Some("unavailable"));

        let err = r
            .historical_vehicle_readings("V1", None, None, None, None, false)
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(r.session().execute_count(), 1);
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..90.0, -180.0f64..180.0).prop_map(|(x, y)| GeoPoint::new(x, y))
    }

    fn area() -> impl Strategy<Value = Area> {
        prop_oneof![
            (point(), 0.001f64..5.0).prop_map(|(c, r)| Area::Circle {
                center: c,
                radius: r
            }),
            (point(), point()).prop_map(|(a, b)| Area::BoundingBox { min: a, max: b }),
        ]
    }

    proptest! {
        #[test]
        fn area_without_filter_has_one_predicate(area in area()) {
            let query = repo().current_readings_query(&area, None, false).unwrap();
            prop_assert_eq!(query.predicates.len(), 1);
            prop_assert_eq!(query.limit, DEFAULT_RESULT_LIMIT);
            let sql = query.build();
            prop_assert!(!sql.contains(" AND "));
            prop_assert!(sql.ends_with(" LIMIT 100"));
        }

        #[test]
        fn area_and_filter_join_in_order(area in area(), filter in ".+") {
            let query = repo()
                .current_readings_query(&area, Some(&filter), false)
                .unwrap();
            let expected = format!("{} AND {}", format::format_area(&area), filter);
            prop_assert_eq!(&query.predicates, &vec![format::format_area(&area), filter.clone()]);
            let needle = format!(r#""q": "{}""#, expected);
            prop_assert!(query.build().contains(&needle));
        }

        #[test]
        fn latest_always_descending_limit_one(
            vehicle in "[A-Z][0-9]{1,5}",
            measurements in any::<bool>(),
            with_filter in any::<bool>(),
        ) {
            let filter = with_filter.then_some("speed>30");
            let query = repo()
                .latest_vehicle_query(&vehicle, None, None, filter, measurements)
                .unwrap();
            prop_assert_eq!(query.order, Some(Order::descending()));
            prop_assert_eq!(query.limit, 1);
            let sql = query.build();
            prop_assert!(
                sql.ends_with(r#", "sort": "date desc"}' LIMIT 1"#),
                "unexpected statement: {}",
                sql
            );
        }

        #[test]
        fn vehicle_history_order_is_ascending(descending in any::<bool>()) {
            let query = repo()
                .historical_vehicle_query("V1", None, None, None, Some(Order { descending }), false)
                .unwrap();
            prop_assert_eq!(query.order, Some(Order::ascending()));
        }
    }
}
