//! Heuristic dispatch over loaded preprocessing artifacts.
//!
//! [`EstimationService`] owns every artifact for the lifetime of the
//! process and hands out cheap estimators that borrow them. Query-time
//! failures never escape [`EstimationService::estimate`]: they come back
//! as a failed [`EstimationResult`].

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use water_route_models::{DistanceEstimate, EstimationResult, GeoPoint, Heuristic};
use water_route_preprocess::bridge_route::BridgeRoutePreprocessing;
use water_route_preprocess::circuity::CircuityTable;
use water_route_preprocess::water_graph::WaterGraphArtifacts;
use water_route_spatial::{CIRCUITY_FACTOR_GERMANY, Metric, Precision};

use crate::bridge_route::BridgeRouteEstimator;
use crate::overhead::OverheadEstimator;
use crate::water_graph::WaterGraphEstimator;
use crate::{DistanceEstimator, EstimateError, Estimation};

const fn default_min_intersection_gap_m() -> f64 {
    5.0
}

/// Query-time tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationOptions {
    /// From the second bridge-route step on, crossings whose exit lies
    /// closer than this to the current position are ignored.
    #[serde(default = "default_min_intersection_gap_m")]
    pub min_intersection_gap_m: f64,
}

impl Default for EstimationOptions {
    fn default() -> Self {
        Self {
            min_intersection_gap_m: default_min_intersection_gap_m(),
        }
    }
}

impl EstimationOptions {
    #[must_use]
    pub const fn min_gap(&self) -> DistanceEstimate {
        DistanceEstimate::from_meters(self.min_intersection_gap_m)
    }
}

/// Holds the preprocessing output of every heuristic family.
#[derive(Default)]
pub struct EstimationService {
    bridge_routes: Option<BridgeRoutePreprocessing>,
    water_graphs: Option<WaterGraphArtifacts>,
    circuity: BTreeMap<u32, CircuityTable>,
    options: EstimationOptions,
}

impl EstimationService {
    /// A service that only knows the two plain metrics.
    #[must_use]
    pub fn new(options: EstimationOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bridge_routes(mut self, artifacts: BridgeRoutePreprocessing) -> Self {
        self.bridge_routes = Some(artifacts);
        self
    }

    #[must_use]
    pub fn with_water_graphs(mut self, artifacts: WaterGraphArtifacts) -> Self {
        self.water_graphs = Some(artifacts);
        self
    }

    /// Registers the circuity table sampled from `sample_size` points.
    #[must_use]
    pub fn with_circuity_table(mut self, sample_size: u32, table: CircuityTable) -> Self {
        self.circuity.insert(sample_size, table);
        self
    }

    /// Heuristics whose artifacts are loaded.
    #[must_use]
    pub fn available_heuristics(&self) -> Vec<Heuristic> {
        let sizes: Vec<u32> = self.circuity.keys().copied().collect();
        Heuristic::all(&sizes)
            .into_iter()
            .filter(|h| self.estimator(*h).is_ok())
            .collect()
    }

    /// An estimator for `heuristic` borrowing this service's artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingArtifact`] if the preprocessing
    /// `heuristic` needs was not loaded.
    pub fn estimator(
        &self,
        heuristic: Heuristic,
    ) -> Result<Box<dyn DistanceEstimator + '_>, EstimateError> {
        let missing = || EstimateError::MissingArtifact {
            what: heuristic.to_string(),
        };

        Ok(match heuristic {
            Heuristic::FlatEarth => Box::new(Metric::FlatEarth),
            Heuristic::GreatCircle => Box::new(Metric::GreatCircle),
            Heuristic::BridgeRoute {
                recalculated,
                split,
            } => {
                let pre = self.bridge_routes.as_ref().ok_or_else(missing)?;
                let artifacts = if split { &pre.split } else { &pre.whole };
                Box::new(BridgeRouteEstimator::new(
                    artifacts,
                    Metric::FlatEarth,
                    recalculated,
                    self.options.min_gap(),
                ))
            }
            Heuristic::WaterGraph { circuity } => {
                let artifacts = self.water_graphs.as_ref().ok_or_else(missing)?;
                Box::new(WaterGraphEstimator::new(
                    artifacts,
                    artifacts.metric(),
                    circuity,
                ))
            }
            Heuristic::Overhead { sample_size } => {
                let table = self.circuity.get(&sample_size).ok_or_else(missing)?;
                Box::new(OverheadEstimator::new(table))
            }
        })
    }

    /// Runs one estimation and records how long it took.
    #[must_use]
    pub fn estimate(
        &self,
        heuristic: Heuristic,
        start: GeoPoint,
        dest: GeoPoint,
        include_path: bool,
    ) -> EstimationResult {
        let started = Instant::now();
        let outcome = if start == dest {
            Ok(Estimation::direct(DistanceEstimate::ZERO, start, dest))
        } else {
            self.estimator(heuristic)
                .and_then(|estimator| estimator.estimate(start, dest))
        };
        let elapsed_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);

        match outcome {
            Ok(estimation) => EstimationResult {
                heuristic,
                start,
                destination: dest,
                distance: Some(estimation.distance),
                circuity_distance: circuity_distance(heuristic, estimation.distance),
                elapsed_ns,
                path: include_path.then_some(estimation.path),
                failed: false,
                error_message: None,
            },
            Err(e) => {
                log::warn!("{heuristic} failed for {start} -> {dest}: {e}");
                EstimationResult::failure(heuristic, start, dest, elapsed_ns, e.to_string())
            }
        }
    }

    /// Whether the straight line crosses any water-graph area.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingArtifact`] without water-graph
    /// preprocessing.
    pub fn crosses_water(&self, start: GeoPoint, dest: GeoPoint) -> Result<bool, EstimateError> {
        let artifacts = self
            .water_graphs
            .as_ref()
            .ok_or_else(|| EstimateError::MissingArtifact {
                what: "water-graph areas".to_string(),
            })?;
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        Ok(artifacts.layer().crosses(start, dest, Precision::Exact))
    }

    /// Whether the straight line crosses any bridged water area.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingArtifact`] without bridge-route
    /// preprocessing.
    pub fn crosses_river(&self, start: GeoPoint, dest: GeoPoint) -> Result<bool, EstimateError> {
        let pre = self
            .bridge_routes
            .as_ref()
            .ok_or_else(|| EstimateError::MissingArtifact {
                what: "bridge-route areas".to_string(),
            })?;
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        Ok(pre.whole.layer().crosses(start, dest, Precision::Simplified))
    }
}

fn circuity_distance(heuristic: Heuristic, distance: DistanceEstimate) -> Option<DistanceEstimate> {
    match heuristic {
        Heuristic::FlatEarth | Heuristic::GreatCircle | Heuristic::BridgeRoute { .. } => {
            Some(distance * CIRCUITY_FACTOR_GERMANY)
        }
        Heuristic::WaterGraph { circuity: true } => Some(distance),
        Heuristic::WaterGraph { circuity: false } | Heuristic::Overhead { .. } => None,
    }
}
