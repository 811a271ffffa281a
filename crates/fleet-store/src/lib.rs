//! Read-side access to vehicle telemetry stored in a search-enabled
//! wide-column cluster.
//!
//! This crate turns telemetry search criteria into composite search
//! statements, runs them through a backend [`Session`] and maps the result
//! rows into [`VehicleReading`](fleet_types::VehicleReading)s.
//!
//! # Features
//!
//! - Current readings of every vehicle inside an area
//! - Area history over a timeframe, optionally ordered by date
//! - Latest reading of one vehicle, with optional area and timeframe
//! - Reading history of one vehicle
//! - Optional measurement projection (speed, temperature, dynamic properties)
//! - TOML configuration for keyspace, table names and result limits
//!
//! # Example
//!
//! ```
//! use fleet_store::ReadingRepository;
//! use fleet_store::mock::MockSession;
//! use fleet_types::{Area, GeoPoint, Order, Timeframe};
//! use time::macros::datetime;
//!
//! let repo = ReadingRepository::new(MockSession::new());
//!
//! let area = Area::circle(GeoPoint::new(48.85, 2.35), 0.1)?;
//! let timeframe = Timeframe::between(
//!     datetime!(2024-01-01 00:00:00 UTC),
//!     datetime!(2024-01-02 00:00:00 UTC),
//! )?;
//! let readings = repo.historical_readings_by_area(
//!     &area,
//!     &timeframe,
//!     Some("speed:[90 TO *]"),
//!     Some(Order::descending()),
//!     true,
//! )?;
//! assert!(readings.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod error;
pub mod format;
pub mod mapper;
pub mod mock;
mod queries;
pub mod session;
mod store;

pub use config::{
    BackendConfig, Config, ConfigError, QueryConfig, ValidationError, default_config_path,
};
pub use error::{BackendError, Error, Result};
pub use queries::{DEFAULT_RESULT_LIMIT, LATEST_LIMIT, SearchQuery};
pub use session::{Row, Session};
pub use store::ReadingRepository;
