#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline preprocessing for the graph-based heuristics.
//!
//! Everything produced here is built once, before the first query, and is
//! read-only afterwards:
//!
//! - [`bridge_route::BridgeRoutePreprocessing`] - water areas with their
//!   merged bridges, whole and ring-split.
//! - [`water_graph::WaterGraphArtifacts`] - split sub-areas with boundary
//!   graphs, boundary edges and bridge vertices.
//! - [`circuity::CircuityTable`] - sampled road/great-circle ratios with
//!   their on-disk cache.

pub mod association;
pub mod bridge_route;
pub mod circuity;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod graph;
pub mod merger;
pub mod splitter;
pub mod water_graph;

use serde::{Deserialize, Serialize};
use water_route_models::ModelError;
use water_route_source::SourceError;
use water_route_spatial::Metric;

/// Errors that can occur during preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// A collaborator failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// I/O error (cache read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of a cache document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted point key could not be parsed back.
    #[error("Invalid point key {key:?}: {source}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why parsing failed.
        source: ModelError,
    },

    /// Bridge segments of one component could not be spliced into one line.
    #[error("Cannot merge bridge {name}: {message}")]
    Merge {
        /// Name of the bridge being merged.
        name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A ring walk did not come back to its start vertex.
    #[error("Ring walk from vertex {start} did not close after {steps} steps")]
    NonTerminatingWalk {
        /// Ring index the walk started from.
        start: usize,
        /// Steps taken before giving up.
        steps: usize,
    },

    /// No sample point could be snapped onto the road network.
    #[error("No reference point could be snapped for sample size {sample_size}")]
    NoReferencePoints {
        /// Requested number of sample points.
        sample_size: usize,
    },
}

/// Tunables of the preprocessing pipeline. Missing TOML fields take the
/// documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Douglas-Peucker tolerance in degrees.
    #[serde(default = "default_simplify_tolerance")]
    pub simplify_tolerance: f64,
    /// Areas with fewer boundary vertices stay whole in the bridge-route
    /// split variant.
    #[serde(default = "default_min_split_vertices")]
    pub min_split_vertices: usize,
    /// Metric weighting water-graph boundary edges. Query-time edges of
    /// the water-graph estimator use the same one.
    #[serde(default)]
    pub graph_metric: Metric,
    /// Scale water-graph boundary edges by the circuity factor.
    #[serde(default)]
    pub circuity_in_graph: bool,
    /// Bridgeless areas larger than this (square meters) still get a
    /// water graph.
    #[serde(default = "default_important_area_sq_m")]
    pub important_area_sq_m: f64,
    /// Bridge candidates closer than this (meters) to a sub-area belong
    /// to it.
    #[serde(default = "default_bridge_reassociation_m")]
    pub bridge_reassociation_m: f64,
    /// Bridges of the parent area closer than this (meters) to a sub-area
    /// belong to it.
    #[serde(default = "default_parent_bridge_radius_m")]
    pub parent_bridge_radius_m: f64,
}

const fn default_simplify_tolerance() -> f64 {
    0.001
}

const fn default_min_split_vertices() -> usize {
    40
}

const fn default_important_area_sq_m() -> f64 {
    20_000.0
}

const fn default_bridge_reassociation_m() -> f64 {
    20.0
}

const fn default_parent_bridge_radius_m() -> f64 {
    1_000.0
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: default_simplify_tolerance(),
            min_split_vertices: default_min_split_vertices(),
            graph_metric: Metric::default(),
            circuity_in_graph: false,
            important_area_sq_m: default_important_area_sq_m(),
            bridge_reassociation_m: default_bridge_reassociation_m(),
            parent_bridge_radius_m: default_parent_bridge_radius_m(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_toml() {
        let config: PreprocessConfig = toml::from_str("").unwrap();
        assert_eq!(config, PreprocessConfig::default());
        assert_eq!(config.min_split_vertices, 40);
        assert_eq!(config.graph_metric, Metric::FlatEarth);
    }

    #[test]
    fn graph_metric_is_configurable() {
        let config: PreprocessConfig = toml::from_str("graph_metric = \"great_circle\"").unwrap();
        assert_eq!(config.graph_metric, Metric::GreatCircle);
        assert!(!config.circuity_in_graph);
    }

    #[test]
    fn fixture_river_has_expected_ring() {
        let river = fixtures::river();
        let ring = river.geometry().0[0].exterior();
        assert_eq!(ring.0.len(), 83);
        assert!((ring.0[20].x - 9.93).abs() < 1e-9);
        assert!((ring.0[61].x - 9.93).abs() < 1e-9);
    }
}
