#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collaborators of the estimation engine.
//!
//! A [`GeodataSource`] supplies raw water-body and bridge-candidate
//! geometry plus random sample points. A [`RoutingOracle`] answers
//! driving-distance and nearest-road questions and serves as ground truth.
//! [`geojson_file::GeoJsonSource`] and [`osrm::OsrmClient`] are the shipped
//! implementations.

pub mod geojson_file;
pub mod osrm;
pub mod progress;
pub mod retry;

use async_trait::async_trait;
use water_route_models::{DistanceEstimate, GeoPoint, Street, WaterArea};

/// Errors that can occur while talking to a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service kept failing after all retries.
    #[error("Service unavailable: {message}")]
    Unavailable {
        /// Last failure observed.
        message: String,
    },

    /// A response or file did not have the expected shape.
    #[error("Malformed data: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Supplier of raw geodata for preprocessing.
pub trait GeodataSource: Send + Sync {
    /// Water areas used by the bridge-route heuristic.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the geodata cannot be read.
    fn water_areas_for_bridge_route(&self) -> Result<Vec<WaterArea>, SourceError>;

    /// Water areas used by the water-graph heuristic.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the geodata cannot be read.
    fn water_areas_for_water_graph(&self) -> Result<Vec<WaterArea>, SourceError>;

    /// Streets that may be bridges.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the geodata cannot be read.
    fn bridge_candidate_streets(&self) -> Result<Vec<Street>, SourceError>;

    /// `n` uniformly distributed points in the study region. The same
    /// `seed` always yields the same points.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if sampling needs data that cannot be read.
    fn random_points(&self, n: usize, seed: u64) -> Result<Vec<GeoPoint>, SourceError>;

    /// `n` random road-intersection points, deterministic for a `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the intersection data cannot be read.
    fn random_intersection_points(&self, n: usize, seed: u64)
    -> Result<Vec<GeoPoint>, SourceError>;
}

/// A driving route returned by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Driving distance.
    pub distance: DistanceEstimate,
    /// Route geometry, when the oracle was asked for it.
    pub geometry: Option<geo::LineString<f64>>,
}

/// A point moved onto the nearest road known to the oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped {
    /// Position on the road.
    pub point: GeoPoint,
    /// Distance between the query point and [`Snapped::point`].
    pub distance: DistanceEstimate,
}

/// External road-routing service.
///
/// `Ok(None)` means the oracle answered but has no result for the query.
/// Transport failures surface as errors; callers treat both as "no value".
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    /// Driving route between two points.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the oracle cannot be reached.
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Option<Route>, SourceError>;

    /// Nearest road position to `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the oracle cannot be reached.
    async fn nearest(&self, point: GeoPoint) -> Result<Option<Snapped>, SourceError>;
}
