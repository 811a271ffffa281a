//! Search criteria supplied by callers: where, when, and in which order.
//!
//! These are plain values. Callers build one set per request and drop it
//! afterwards; nothing here talks to a backend.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CriteriaError, CriteriaResult};

/// A two-dimensional point in the backend's point type.
///
/// Ordinates are kept in backend order: `x` is the first ordinate and `y`
/// the second. Readings treat `x` as latitude and `y` as longitude. That is
/// the storage convention of the telemetry tables, not the usual WKT
/// longitude-first rule, so do not swap them when rendering or mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    /// First ordinate (latitude in the telemetry tables).
    pub x: f64,
    /// Second ordinate (longitude in the telemetry tables).
    pub y: f64,
}

impl GeoPoint {
    /// Create a point from its two ordinates, in backend order.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if neither ordinate is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for GeoPoint {
    /// WKT coordinate pair: `x y`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Geographic region used to constrain results spatially.
///
/// The plain variants can be built directly when the caller has already
/// validated its input. The [`Area::circle`], [`Area::bounding_box`] and
/// [`Area::polygon`] helpers check the shape first.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new shapes in
/// future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[non_exhaustive]
pub enum Area {
    /// Every point within `radius` (in point units, i.e. degrees) of `center`.
    Circle { center: GeoPoint, radius: f64 },
    /// Axis-aligned box between two opposite corners.
    BoundingBox { min: GeoPoint, max: GeoPoint },
    /// Simple polygon. The ring does not need to repeat its first vertex.
    Polygon { vertices: Vec<GeoPoint> },
}

impl Area {
    /// Create a circular area.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::InvalidArea`] if the center is not finite or
    /// the radius is not a positive finite number.
    pub fn circle(center: GeoPoint, radius: f64) -> CriteriaResult<Self> {
        if !center.is_finite() {
            return Err(CriteriaError::InvalidArea(format!(
                "circle center ({center}) is not finite"
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CriteriaError::InvalidArea(format!(
                "circle radius {radius} must be a positive number"
            )));
        }
        Ok(Area::Circle { center, radius })
    }

    /// Create a bounding box from any two opposite corners.
    ///
    /// The corners are normalized so that `min` holds the smaller ordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::InvalidArea`] if a corner is not finite or
    /// the box has zero width or height.
    pub fn bounding_box(a: GeoPoint, b: GeoPoint) -> CriteriaResult<Self> {
        if !a.is_finite() || !b.is_finite() {
            return Err(CriteriaError::InvalidArea(
                "bounding box corners must be finite".to_string(),
            ));
        }
        let min = GeoPoint::new(a.x.min(b.x), a.y.min(b.y));
        let max = GeoPoint::new(a.x.max(b.x), a.y.max(b.y));
        if min.x == max.x || min.y == max.y {
            return Err(CriteriaError::InvalidArea(format!(
                "bounding box ({min}) - ({max}) is degenerate"
            )));
        }
        Ok(Area::BoundingBox { min, max })
    }

    /// Create a polygon from its vertices.
    ///
    /// A trailing vertex equal to the first one is accepted and dropped; the
    /// ring is closed again when rendered.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::InvalidArea`] if a vertex is not finite or
    /// fewer than three distinct vertices remain.
    pub fn polygon(mut vertices: Vec<GeoPoint>) -> CriteriaResult<Self> {
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(CriteriaError::InvalidArea(
                "polygon vertices must be finite".to_string(),
            ));
        }
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(CriteriaError::InvalidArea(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Area::Polygon { vertices })
    }

    /// Boundary ring of a box or polygon, closed (first vertex repeated at
    /// the end). Empty for circles.
    #[must_use]
    pub fn ring(&self) -> Vec<GeoPoint> {
        match self {
            Area::Circle { .. } => Vec::new(),
            Area::BoundingBox { min, max } => vec![
                *min,
                GeoPoint::new(max.x, min.y),
                *max,
                GeoPoint::new(min.x, max.y),
                *min,
            ],
            Area::Polygon { vertices } => {
                let mut ring = vertices.clone();
                if let Some(first) = vertices.first()
                    && vertices.last() != Some(first)
                {
                    ring.push(*first);
                }
                ring
            }
        }
    }
}

/// Time interval constraining the reading timestamp.
///
/// A missing bound leaves that side open. The start is always inclusive;
/// the end is inclusive unless [`Timeframe::exclusive_end`] was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timeframe {
    /// Earliest timestamp to include.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub start: Option<OffsetDateTime>,
    /// Latest timestamp to include (or exclude, see `end_inclusive`).
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub end: Option<OffsetDateTime>,
    /// Whether `end` itself is part of the interval.
    pub end_inclusive: bool,
}

impl Timeframe {
    /// Closed interval `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::InvalidTimeframe`] if `start` is after `end`.
    pub fn between(start: OffsetDateTime, end: OffsetDateTime) -> CriteriaResult<Self> {
        if start > end {
            return Err(CriteriaError::InvalidTimeframe {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
            end_inclusive: true,
        })
    }

    /// Everything at or after `start`.
    #[must_use]
    pub fn since(start: OffsetDateTime) -> Self {
        Self {
            start: Some(start),
            end: None,
            end_inclusive: true,
        }
    }

    /// Everything at or before `end`.
    #[must_use]
    pub fn until(end: OffsetDateTime) -> Self {
        Self {
            start: None,
            end: Some(end),
            end_inclusive: true,
        }
    }

    /// Turn the interval into a half-open one, `[start, end)`.
    #[must_use]
    pub fn exclusive_end(mut self) -> Self {
        self.end_inclusive = false;
        self
    }
}

/// Sort directive over the reading timestamp.
///
/// The default is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    /// Sort by descending time when `true`.
    pub descending: bool,
}

impl Default for Order {
    fn default() -> Self {
        Self::descending()
    }
}

impl Order {
    /// Newest first.
    #[must_use]
    pub const fn descending() -> Self {
        Self { descending: true }
    }

    /// Oldest first.
    #[must_use]
    pub const fn ascending() -> Self {
        Self { descending: false }
    }

    /// Sort keyword understood by the search engine.
    #[must_use]
    pub const fn direction(&self) -> &'static str {
        if self.descending { "desc" } else { "asc" }
    }
}
