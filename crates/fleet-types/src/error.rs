//! Error types for search criteria construction in fleet-types.

use thiserror::Error;

/// Errors raised by the validating constructors of [`Area`](crate::Area)
/// and [`Timeframe`](crate::Timeframe).
///
/// Callers that build criteria from already-validated input can use the
/// plain struct/enum constructors directly; these errors only come from the
/// checked helpers.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CriteriaError {
    /// The timeframe starts after it ends.
    #[error("Invalid timeframe: start {start} is after end {end}")]
    InvalidTimeframe { start: String, end: String },

    /// The area cannot describe a non-empty region.
    #[error("Invalid area: {0}")]
    InvalidArea(String),
}

/// Result type alias using fleet-types' CriteriaError type.
pub type CriteriaResult<T> = std::result::Result<T, CriteriaError>;
