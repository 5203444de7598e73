//! Heuristic identities and the per-query result record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DistanceEstimate, GeoPoint, ModelError};

const OVERHEAD_PREFIX: &str = "OVERHEAD_GRAPH_";

/// A distance-estimation approach.
///
/// Printed and parsed using the names `AIRLINE`, `HAVERSINE`, `BRIDGE_REC`,
/// `BRIDGE_NO_REC`, `BRIDGE_SPLIT_REC`, `BRIDGE_SPLIT_NO_REC`,
/// `WATER_GRAPH`, `WATER_GRAPH_CIRCUITY` and `OVERHEAD_GRAPH_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Heuristic {
    /// Flat-earth projected distance.
    FlatEarth,
    /// Great-circle distance.
    GreatCircle,
    /// Greedy bridge-hopping search.
    BridgeRoute {
        /// Recompute intersections from the current position on every step.
        recalculated: bool,
        /// Use ring-split sub-areas instead of whole water areas.
        split: bool,
    },
    /// Shortest path over per-sub-area boundary graphs.
    WaterGraph {
        /// Weight query-time edges with the circuity-adjusted distance.
        circuity: bool,
    },
    /// Great-circle distance corrected by a sampled circuity table.
    Overhead {
        /// Number of sampled reference points the table was built from.
        sample_size: u32,
    },
}

impl Heuristic {
    /// Every bridge-route variant.
    pub const BRIDGE_ROUTES: [Self; 4] = [
        Self::BridgeRoute {
            recalculated: true,
            split: false,
        },
        Self::BridgeRoute {
            recalculated: false,
            split: false,
        },
        Self::BridgeRoute {
            recalculated: true,
            split: true,
        },
        Self::BridgeRoute {
            recalculated: false,
            split: true,
        },
    ];

    /// All heuristics, with one overhead variant per sample size.
    #[must_use]
    pub fn all(sample_sizes: &[u32]) -> Vec<Self> {
        let mut all = vec![Self::FlatEarth, Self::GreatCircle];
        all.extend(Self::BRIDGE_ROUTES);
        all.push(Self::WaterGraph { circuity: false });
        all.push(Self::WaterGraph { circuity: true });
        all.extend(
            sample_sizes
                .iter()
                .map(|&sample_size| Self::Overhead { sample_size }),
        );
        all
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatEarth => f.write_str("AIRLINE"),
            Self::GreatCircle => f.write_str("HAVERSINE"),
            Self::BridgeRoute {
                recalculated,
                split,
            } => {
                f.write_str("BRIDGE_")?;
                if *split {
                    f.write_str("SPLIT_")?;
                }
                f.write_str(if *recalculated { "REC" } else { "NO_REC" })
            }
            Self::WaterGraph { circuity: false } => f.write_str("WATER_GRAPH"),
            Self::WaterGraph { circuity: true } => f.write_str("WATER_GRAPH_CIRCUITY"),
            Self::Overhead { sample_size } => write!(f, "{OVERHEAD_PREFIX}{sample_size}"),
        }
    }
}

impl FromStr for Heuristic {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bridge = |recalculated, split| Self::BridgeRoute {
            recalculated,
            split,
        };

        Ok(match s.trim() {
            "AIRLINE" => Self::FlatEarth,
            "HAVERSINE" => Self::GreatCircle,
            "BRIDGE_REC" => bridge(true, false),
            "BRIDGE_NO_REC" => bridge(false, false),
            "BRIDGE_SPLIT_REC" => bridge(true, true),
            "BRIDGE_SPLIT_NO_REC" => bridge(false, true),
            "WATER_GRAPH" => Self::WaterGraph { circuity: false },
            "WATER_GRAPH_CIRCUITY" => Self::WaterGraph { circuity: true },
            other => {
                let sample_size = other
                    .strip_prefix(OVERHEAD_PREFIX)
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| ModelError::UnsupportedHeuristic {
                        name: other.to_string(),
                    })?;
                Self::Overhead { sample_size }
            }
        })
    }
}

impl From<Heuristic> for String {
    fn from(h: Heuristic) -> Self {
        h.to_string()
    }
}

impl TryFrom<String> for Heuristic {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Outcome of one estimation request.
///
/// Failures are carried as data: `failed` is set and `error_message`
/// explains why, so a single bad query never escapes the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationResult {
    /// The approach that produced this result.
    pub heuristic: Heuristic,
    /// Requested start point.
    pub start: GeoPoint,
    /// Requested destination point.
    pub destination: GeoPoint,
    /// Estimated distance, absent on failure.
    pub distance: Option<DistanceEstimate>,
    /// Circuity-adjusted distance where the approach defines one.
    pub circuity_distance: Option<DistanceEstimate>,
    /// Wall-clock time spent estimating, in nanoseconds.
    pub elapsed_ns: u64,
    /// Route for visualization, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<GeoPoint>>,
    /// Whether the estimation failed.
    pub failed: bool,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EstimationResult {
    /// Builds a failed result.
    #[must_use]
    pub fn failure(
        heuristic: Heuristic,
        start: GeoPoint,
        destination: GeoPoint,
        elapsed_ns: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            heuristic,
            start,
            destination,
            distance: None,
            circuity_distance: None,
            elapsed_ns,
            path: None,
            failed: true,
            error_message: Some(message.into()),
        }
    }
}
