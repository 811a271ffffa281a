//! Data model for vehicle telemetry search.
//!
//! This crate holds the values exchanged with the search layer in
//! `fleet-store`: the criteria a caller passes in and the readings it gets
//! back. It has no backend dependencies.
//!
//! # Features
//!
//! - Search criteria: [`Area`], [`Timeframe`], [`Order`]
//! - Backend point type with explicit ordinate order: [`GeoPoint`]
//! - Result type [`VehicleReading`] with an ordered [`Measurements`] set
//! - Optional serde support (`serde` feature, on by default)
//!
//! # Example
//!
//! ```
//! use fleet_types::{Area, GeoPoint, Order, Timeframe};
//! use time::macros::datetime;
//!
//! let area = Area::circle(GeoPoint::new(51.5, -0.12), 0.05)?;
//! let window = Timeframe::between(
//!     datetime!(2024-03-01 00:00:00 UTC),
//!     datetime!(2024-03-02 00:00:00 UTC),
//! )?;
//! let order = Order::ascending();
//! # let _ = (area, window, order);
//! # Ok::<(), fleet_types::CriteriaError>(())
//! ```

pub mod criteria;
pub mod error;
pub mod types;

pub use criteria::{Area, GeoPoint, Order, Timeframe};
pub use error::{CriteriaError, CriteriaResult};
pub use types::{Measurements, SPEED, TEMPERATURE, VehicleReading};
