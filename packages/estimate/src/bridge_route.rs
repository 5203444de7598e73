//! Greedy bridge-hopping search.
//!
//! From the current position, the first water area on the way to the
//! destination is crossed over its bridge nearest to the crossing; the
//! search then continues from that bridge. It ends when the straight line
//! to the destination crosses no more water, or no unused bridge is left.

use geo::{Distance as _, Euclidean, LineString};
use water_route_models::{Bridge, DistanceEstimate, GeoPoint};
use water_route_preprocess::bridge_route::BridgeRouteArtifacts;
use water_route_spatial::{Intersection, Metric, Precision, sort_by_distance_from_start};

use crate::{DistanceEstimator, EstimateError, Estimation};

/// Bridge-route estimator over one set of preprocessed areas.
pub struct BridgeRouteEstimator<'a> {
    artifacts: &'a BridgeRouteArtifacts,
    metric: Metric,
    recalculated: bool,
    min_gap: DistanceEstimate,
}

impl<'a> BridgeRouteEstimator<'a> {
    /// `recalculated` recomputes the intersections from the current
    /// position after every hop; otherwise the initial list is consumed.
    #[must_use]
    pub const fn new(
        artifacts: &'a BridgeRouteArtifacts,
        metric: Metric,
        recalculated: bool,
        min_gap: DistanceEstimate,
    ) -> Self {
        Self {
            artifacts,
            metric,
            recalculated,
            min_gap,
        }
    }

    /// Whether the straight line between the points crosses any area.
    #[must_use]
    pub fn crosses_water(&self, start: GeoPoint, dest: GeoPoint) -> bool {
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        self.artifacts
            .layer()
            .crosses(start, dest, Precision::Simplified)
    }

    fn intersections(&self, from: GeoPoint, dest: GeoPoint, step: usize) -> Vec<Intersection> {
        sort_by_distance_from_start(
            from,
            self.artifacts
                .layer()
                .intersections(from, dest, Precision::Simplified),
            step,
            self.min_gap,
        )
    }

    /// The first intersection (nearest-first) whose area's nearest bridge
    /// has not been used yet, as `(intersections consumed, bridge)`.
    fn next_bridge<'b>(
        &'b self,
        pending: &[Intersection],
        used: &[Bridge],
    ) -> Option<(usize, &'b Bridge)> {
        pending.iter().enumerate().find_map(|(k, intersection)| {
            nearest_bridge(self.artifacts.bridges_of(intersection.area), &intersection.line)
                .filter(|bridge| !used.contains(bridge))
                .map(|bridge| (k + 1, bridge))
        })
    }
}

fn nearest_bridge<'b>(bridges: &'b [Bridge], crossing: &LineString<f64>) -> Option<&'b Bridge> {
    let mut best: Option<(f64, &Bridge)> = None;
    for bridge in bridges {
        let d = Euclidean.distance(crossing, bridge.line());
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, bridge));
        }
    }
    best.map(|(_, b)| b)
}

impl DistanceEstimator for BridgeRouteEstimator<'_> {
    fn estimate(&self, start: GeoPoint, dest: GeoPoint) -> Result<Estimation, EstimateError> {
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        if start == dest {
            return Ok(Estimation::direct(DistanceEstimate::ZERO, start, dest));
        }

        let mut current = start;
        let mut step = 1;
        let mut distance = DistanceEstimate::ZERO;
        let mut path = vec![start];
        let mut used: Vec<Bridge> = Vec::new();
        let mut pending = Vec::new();

        loop {
            if self.recalculated || step == 1 {
                pending = self.intersections(current, dest, step);
            }
            if pending.is_empty() {
                break;
            }

            let Some((consumed, bridge)) = self.next_bridge(&pending, &used) else {
                log::debug!("No unused bridge left after {} hops", used.len());
                break;
            };
            if !self.recalculated {
                pending.drain(..consumed);
            }

            let target = bridge.representative();
            log::trace!("Step {step}: {current} -> bridge {} at {target}", bridge.name());
            distance += self.metric.distance(current, target);
            used.push(bridge.clone());
            path.push(target);
            current = target;
            step += 1;
        }

        distance += self.metric.distance(current, dest);
        if path.last() != Some(&dest) {
            path.push(dest);
        }

        Ok(Estimation {
            distance,
            path,
            bridges: used,
        })
    }
}
