#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-to-point distance estimators that account for water crossings.
//!
//! Every estimator implements [`DistanceEstimator`] and returns the
//! distance together with the path it took, so one estimator can serve
//! any number of concurrent callers. [`service::EstimationService`] owns
//! the preprocessing artifacts and dispatches over
//! [`water_route_models::Heuristic`].

pub mod bridge_route;
pub mod overhead;
pub mod service;
pub mod shortest_path;
pub mod simple;
pub mod water_graph;

#[cfg(test)]
pub(crate) mod fixtures;

use water_route_models::{Bridge, DistanceEstimate, GeoPoint};

/// Errors that can occur while estimating a distance.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    /// The heuristic needs preprocessing that has not been loaded.
    #[error("Preprocessing for {what} is not available")]
    MissingArtifact {
        /// Which artifact is missing.
        what: String,
    },

    /// Start and destination are not connected in the combined graph.
    #[error("No path between {start} and {dest}")]
    NoPath {
        /// Canonical start.
        start: GeoPoint,
        /// Canonical destination.
        dest: GeoPoint,
    },

    /// The circuity table has no ratio for a pair of reference points.
    #[error("No circuity ratio between {from} and {to}")]
    MissingRatio {
        /// Reference point nearest to the start.
        from: GeoPoint,
        /// Reference point nearest to the destination.
        to: GeoPoint,
    },

    /// The circuity table has no reference points.
    #[error("Circuity table has no reference points")]
    EmptyReferenceIndex,
}

/// Outcome of one estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimation {
    /// Estimated travel distance.
    pub distance: DistanceEstimate,
    /// Points the estimate passes through, from the canonical start to the
    /// canonical destination.
    pub path: Vec<GeoPoint>,
    /// Bridges used, in order.
    pub bridges: Vec<Bridge>,
}

impl Estimation {
    /// A straight-line estimate from `start` to `dest`.
    #[must_use]
    pub fn direct(distance: DistanceEstimate, start: GeoPoint, dest: GeoPoint) -> Self {
        let path = if start == dest {
            vec![start]
        } else {
            vec![start, dest]
        };
        Self {
            distance,
            path,
            bridges: Vec::new(),
        }
    }
}

/// A symmetric point-to-point distance estimator.
///
/// Implementations canonicalize `(start, dest)` so that both argument
/// orders give the same result, and return zero for identical points.
pub trait DistanceEstimator: Send + Sync {
    /// Estimates the travel distance from `start` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError`] if the estimator cannot produce a value
    /// for this pair.
    fn estimate(&self, start: GeoPoint, dest: GeoPoint) -> Result<Estimation, EstimateError>;
}
