#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types shared by every stage of water-crossing distance estimation.
//!
//! Points and distances are plain `Copy` values. Water areas and bridges
//! are produced once during preprocessing and shared read-only by all
//! queries afterwards, so their identity (name plus exact geometry) is what
//! equality and hashing are defined over.

pub mod heuristic;
pub mod water;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use heuristic::{EstimationResult, Heuristic};
pub use water::{Bridge, Street, WaterArea};

/// Errors raised while constructing or parsing model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A stringified point did not match `GeoPoint[lat=<f64>, lon=<f64>]`.
    #[error("Invalid point literal: {input}")]
    InvalidPoint {
        /// The rejected input.
        input: String,
    },

    /// A heuristic name is not one of the supported approaches.
    #[error("Unsupported heuristic: {name}")]
    UnsupportedHeuristic {
        /// The rejected name.
        name: String,
    },

    /// A bridge line needs at least two coordinates.
    #[error("Bridge {name} has fewer than two coordinates")]
    DegenerateBridge {
        /// Name of the offending bridge.
        name: String,
    },

    /// A bridge candidate street must consist of exactly one line.
    #[error("Street {name} has {parts} line parts, expected exactly one")]
    MultiPartStreet {
        /// Name of the offending street.
        name: String,
        /// Number of parts found.
        parts: usize,
    },
}

/// A WGS84 position.
///
/// Equality and hashing are exact on the bit patterns of both coordinates.
/// The total order compares longitude first, then latitude, and exists so
/// that `(start, destination)` pairs can be canonicalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Orders a pair so that the greater point comes first.
    ///
    /// Every estimator runs on the canonical pair, which makes
    /// `estimate(a, b)` and `estimate(b, a)` identical.
    #[must_use]
    pub fn canonical_pair(a: Self, b: Self) -> (Self, Self) {
        if a < b { (b, a) } else { (a, b) }
    }

    /// Returns `[lon, lat]`, the planar layout used by the spatial indexes.
    #[must_use]
    pub const fn to_xy(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for GeoPoint {}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl PartialOrd for GeoPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GeoPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lon
            .total_cmp(&other.lon)
            .then_with(|| self.lat.total_cmp(&other.lat))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeoPoint[lat={}, lon={}]", self.lat, self.lon)
    }
}

impl FromStr for GeoPoint {
    type Err = ModelError;

    /// Parses the [`Display`](fmt::Display) form back into a point. Used as
    /// the key format of persisted circuity tables.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidPoint {
            input: s.to_string(),
        };

        let body = s
            .trim()
            .strip_prefix("GeoPoint[lat=")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(invalid)?;
        let (lat, lon) = body.split_once(", lon=").ok_or_else(invalid)?;

        Ok(Self {
            lat: lat.trim().parse().map_err(|_| invalid())?,
            lon: lon.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Self { x: p.lon, y: p.lat }
    }
}

impl From<geo::Coord<f64>> for GeoPoint {
    fn from(c: geo::Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Self::new(p.lon, p.lat)
    }
}

/// A non-negative travel distance in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceEstimate(f64);

impl DistanceEstimate {
    /// The zero distance.
    pub const ZERO: Self = Self(0.0);

    /// Creates an estimate from meters. Negative and NaN inputs become zero.
    #[must_use]
    pub const fn from_meters(meters: f64) -> Self {
        Self(meters.max(0.0))
    }

    /// Creates an estimate from kilometers.
    #[must_use]
    pub const fn from_km(km: f64) -> Self {
        Self::from_meters(km * 1000.0)
    }

    /// Distance in meters.
    #[must_use]
    pub const fn meters(self) -> f64 {
        self.0
    }

    /// Distance in kilometers.
    #[must_use]
    pub const fn km(self) -> f64 {
        self.0 / 1000.0
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl Add for DistanceEstimate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for DistanceEstimate {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<f64> for DistanceEstimate {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::from_meters(self.0 * factor)
    }
}

impl Sum for DistanceEstimate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for DistanceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn point_display_parses_back_exactly() {
        let p = GeoPoint::new(49.791_234_567_89, 9.931_000_000_000_1);
        let parsed: GeoPoint = p.to_string().parse().unwrap();
        assert_eq!(parsed, p);
        assert_eq!(parsed.lat.to_bits(), p.lat.to_bits());
    }

    #[test]
    fn point_parse_rejects_garbage() {
        assert!("GeoPoint[lat=1.0]".parse::<GeoPoint>().is_err());
        assert!("lat=1.0, lon=2.0".parse::<GeoPoint>().is_err());
        assert!("GeoPoint[lat=a, lon=2.0]".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn ordering_compares_longitude_first() {
        let west_north = GeoPoint::new(50.0, 9.0);
        let east_south = GeoPoint::new(49.0, 10.0);
        assert!(west_north < east_south);

        let low = GeoPoint::new(49.0, 9.0);
        let high = GeoPoint::new(50.0, 9.0);
        assert!(low < high);
    }

    #[test]
    fn canonical_pair_is_direction_independent() {
        let a = GeoPoint::new(49.785, 9.925);
        let b = GeoPoint::new(49.797, 9.928);
        assert_eq!(GeoPoint::canonical_pair(a, b), GeoPoint::canonical_pair(b, a));
        assert_eq!(GeoPoint::canonical_pair(a, b).0, b);
    }

    #[test]
    fn equality_is_bitwise() {
        let mut set = HashSet::new();
        set.insert(GeoPoint::new(0.0, 1.0));
        assert!(set.contains(&GeoPoint::new(0.0, 1.0)));
        assert_ne!(GeoPoint::new(0.0, 1.0), GeoPoint::new(-0.0, 1.0));
    }

    #[test]
    fn distance_arithmetic() {
        let d = DistanceEstimate::from_km(1.5) + DistanceEstimate::from_meters(500.0);
        assert!((d.meters() - 2000.0).abs() < f64::EPSILON);
        assert!(((d * 1.32).meters() - 2640.0).abs() < 1e-9);
        assert!(DistanceEstimate::from_meters(-3.0).is_zero());
        assert!(DistanceEstimate::ZERO.is_zero());

        let total: DistanceEstimate = [1.0, 2.0, 3.0]
            .into_iter()
            .map(DistanceEstimate::from_meters)
            .sum();
        assert!((total.meters() - 6.0).abs() < f64::EPSILON);
    }
}
