//! Shortest path around water over per-sub-area boundary graphs.
//!
//! For each crossing on the straight line, the crossed sub-area's
//! boundary graph is merged into a per-query graph and tied to the
//! previous position. Bridges of a sub-area connect it to the next one.
//! The estimate is the shortest path from start to destination in that
//! graph.

use std::collections::HashSet;

use geo::{Distance as _, Euclidean, Line, Point};
use rayon::prelude::*;
use water_route_models::{DistanceEstimate, GeoPoint};
use water_route_preprocess::graph::WaterGraph;
use water_route_preprocess::water_graph::{SubArea, WaterGraphArtifacts};
use water_route_spatial::geometry::planar_distance_sq;
use water_route_spatial::{DEFAULT_MIN_GAP, Metric, Precision, sort_by_distance_from_start};

use crate::shortest_path::bidirectional_dijkstra;
use crate::{DistanceEstimator, EstimateError, Estimation};

/// Sub-areas with more boundary edges than this are scanned in parallel.
const PARALLEL_EDGE_SCAN: usize = 3_000;

/// Water-graph estimator.
pub struct WaterGraphEstimator<'a> {
    artifacts: &'a WaterGraphArtifacts,
    metric: Metric,
    circuity: bool,
}

impl<'a> WaterGraphEstimator<'a> {
    /// With `circuity`, edges added at query time and the direct distance
    /// are scaled by the circuity factor.
    #[must_use]
    pub const fn new(artifacts: &'a WaterGraphArtifacts, metric: Metric, circuity: bool) -> Self {
        Self {
            artifacts,
            metric,
            circuity,
        }
    }

    /// Whether the straight line between the points crosses any sub-area.
    #[must_use]
    pub fn crosses_water(&self, start: GeoPoint, dest: GeoPoint) -> bool {
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        self.artifacts.layer().crosses(start, dest, Precision::Exact)
    }

    fn connect(&self, graph: &mut WaterGraph, a: GeoPoint, b: GeoPoint) {
        graph.add_edge(a, b, self.metric.weighted(a, b, self.circuity));
    }
}

/// Boundary vertices closest to the three query points.
#[derive(Debug, Clone, Copy)]
struct Closest {
    entry: GeoPoint,
    exit: GeoPoint,
    last: GeoPoint,
}

type Best = [(f64, usize); 3];

fn better(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    if b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)).is_lt() {
        b
    } else {
        a
    }
}

/// Finds, for each of `entry`, `exit` and `last`, the nearest boundary
/// edge and returns its endpoint nearest to the query point.
fn closest_vertices(
    sub: &SubArea,
    entry: GeoPoint,
    exit: GeoPoint,
    last: GeoPoint,
) -> Option<Closest> {
    let queries: [Point<f64>; 3] = [entry.into(), exit.into(), last.into()];
    let identity: Best = [(f64::INFINITY, usize::MAX); 3];

    let scan = |mut best: Best, (i, edge): (usize, &Line<f64>)| {
        for (slot, q) in best.iter_mut().zip(&queries) {
            *slot = better(*slot, (Euclidean.distance(edge, q), i));
        }
        best
    };

    let best = if sub.edges.len() > PARALLEL_EDGE_SCAN {
        sub.edges
            .par_iter()
            .enumerate()
            .fold(|| identity, scan)
            .reduce(
                || identity,
                |a, b| [better(a[0], b[0]), better(a[1], b[1]), better(a[2], b[2])],
            )
    } else {
        sub.edges.iter().enumerate().fold(identity, scan)
    };

    let endpoint = |(_, i): (f64, usize), q: Point<f64>| {
        let edge = sub.edges.get(i)?;
        let start = Point::from(edge.start);
        let end = Point::from(edge.end);
        Some(if planar_distance_sq(start, q) <= planar_distance_sq(end, q) {
            GeoPoint::from(edge.start)
        } else {
            GeoPoint::from(edge.end)
        })
    };

    Some(Closest {
        entry: endpoint(best[0], queries[0])?,
        exit: endpoint(best[1], queries[1])?,
        last: endpoint(best[2], queries[2])?,
    })
}

impl DistanceEstimator for WaterGraphEstimator<'_> {
    fn estimate(&self, start: GeoPoint, dest: GeoPoint) -> Result<Estimation, EstimateError> {
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        if start == dest {
            return Ok(Estimation::direct(DistanceEstimate::ZERO, start, dest));
        }

        let intersections = sort_by_distance_from_start(
            start,
            self.artifacts
                .layer()
                .intersections(start, dest, Precision::Exact),
            1,
            DEFAULT_MIN_GAP,
        );
        if intersections.is_empty() {
            let direct = self.metric.weighted(start, dest, self.circuity);
            return Ok(Estimation::direct(direct, start, dest));
        }

        let mut combined = WaterGraph::new();
        combined.add_vertex(start);
        combined.add_vertex(dest);

        let mut merged = HashSet::new();
        let mut last_end = start;
        let mut last_water: Option<&SubArea> = None;
        let mut last_area: Option<usize> = None;
        let mut has_multiple = false;

        for intersection in &intersections {
            let sub = self
                .artifacts
                .sub_area(intersection.area)
                .ok_or_else(|| EstimateError::MissingArtifact {
                    what: format!("water-graph sub-area {}", intersection.area),
                })?;
            if merged.insert(intersection.area) {
                combined.merge(&sub.graph);
            }

            let Some(near) =
                closest_vertices(sub, intersection.entry(), intersection.exit(), last_end)
            else {
                log::warn!("Sub-area {} has no boundary edges", intersection.area);
                continue;
            };

            self.connect(&mut combined, last_end, near.entry);
            self.connect(&mut combined, last_end, near.last);

            if last_area == Some(intersection.area) {
                has_multiple = true;
            } else {
                if !has_multiple {
                    for &b in last_water.map_or(&[][..], |w| w.bridge_vertices.as_slice()) {
                        self.connect(&mut combined, b, near.entry);
                    }
                }
                has_multiple = false;
            }

            last_end = near.exit;
            last_water = Some(sub);
            last_area = Some(intersection.area);
        }

        self.connect(&mut combined, last_end, dest);
        for &b in last_water.map_or(&[][..], |w| w.bridge_vertices.as_slice()) {
            self.connect(&mut combined, b, dest);
        }

        let (Some(source), Some(target)) = (combined.node(start), combined.node(dest)) else {
            return Err(EstimateError::NoPath { start, dest });
        };
        let found = bidirectional_dijkstra(combined.inner(), source, target, |w| *w)
            .ok_or(EstimateError::NoPath { start, dest })?;

        log::trace!(
            "Water graph with {} vertices and {} edges, path of {} vertices",
            combined.vertex_count(),
            combined.edge_count(),
            found.nodes.len()
        );

        Ok(Estimation {
            distance: DistanceEstimate::from_meters(found.distance),
            path: found.nodes.iter().map(|&n| combined.inner()[n]).collect(),
            bridges: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use water_route_preprocess::fixtures::{comb_lake, river};
    use water_route_spatial::CIRCUITY_FACTOR_GERMANY;

    use super::*;
    use crate::fixtures::{self, BELOW_LAKE, D, S};

    #[test]
    fn crossing_the_river_leaves_over_the_bridge() {
        let artifacts = fixtures::water_graphs();
        let estimator = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false);
        let e = estimator.estimate(S, D).unwrap();

        // D -> north bridge head -> S
        assert!((e.distance.meters() - 1431.0).abs() < 10.0, "got {}", e.distance);
        assert_eq!(e.path, vec![D, GeoPoint::new(49.792, 9.93), S]);
        assert!(e.distance.meters() > Metric::GreatCircle.distance(S, D).meters());
    }

    #[test]
    fn estimate_is_symmetric() {
        let artifacts = fixtures::water_graphs();
        let estimator = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false);
        assert_eq!(estimator.estimate(S, D).unwrap(), estimator.estimate(D, S).unwrap());
    }

    #[test]
    fn no_crossing_is_the_direct_distance() {
        let artifacts = fixtures::water_graphs();
        let plain = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false);
        let scaled = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, true);
        let north = GeoPoint::new(49.797, 9.95);

        let d = plain.estimate(D, north).unwrap().distance;
        assert_eq!(d, Metric::FlatEarth.distance(D, north));
        let c = scaled.estimate(D, north).unwrap().distance;
        assert!((c.meters() - d.meters() * CIRCUITY_FACTOR_GERMANY).abs() < 1e-6);
        assert!(!plain.crosses_water(D, north));
        assert!(plain.crosses_water(S, D));
    }

    #[test]
    fn circuity_mode_is_never_shorter() {
        let artifacts = fixtures::water_graphs();
        let plain = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false)
            .estimate(S, D)
            .unwrap();
        let scaled = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, true)
            .estimate(S, D)
            .unwrap();
        assert!(scaled.distance.meters() > plain.distance.meters());
    }

    #[test]
    fn two_crossings_of_one_lake_still_find_a_path() {
        let artifacts = fixtures::water_graphs();
        let estimator = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false);
        let west = GeoPoint::new(49.705, 9.79);
        let east = GeoPoint::new(49.705, 9.84);

        let crossings = artifacts
            .layer()
            .intersections(east, west, Precision::Exact);
        assert_eq!(crossings.len(), 2, "both arms of the lake are crossed");
        assert_eq!(crossings[0].area, crossings[1].area);

        let e = estimator.estimate(west, east).unwrap();
        assert!(e.distance.meters() >= Metric::FlatEarth.distance(west, east).meters());
        assert!(e.path.len() >= 4);
    }

    #[test]
    fn three_arms_of_one_lake_reduce_to_entry_and_exit() {
        let artifacts = fixtures::water_graphs_over(vec![comb_lake()]);
        let west = GeoPoint::new(49.705, 9.85);
        let east = GeoPoint::new(49.705, 9.92);

        let crossings = sort_by_distance_from_start(
            east,
            artifacts.layer().intersections(east, west, Precision::Exact),
            1,
            DEFAULT_MIN_GAP,
        );
        assert_eq!(crossings.len(), 2, "the middle arm is not reported");
        assert_eq!(crossings[0].area, crossings[1].area);
        assert!((crossings[0].entry().lon - 9.91).abs() < 1e-9);
        assert!((crossings[1].exit().lon - 9.86).abs() < 1e-9);

        let estimator = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, false);
        let e = estimator.estimate(west, east).unwrap();
        assert!(e.distance.meters().is_finite());
        assert!(e.distance.meters() >= Metric::GreatCircle.distance(west, east).meters());
        assert!(e.path.len() >= 4);
        assert_eq!(e, estimator.estimate(east, west).unwrap());
    }

    #[test]
    fn forcing_another_lake_onto_the_route_never_shortens_it() {
        let river_only = fixtures::water_graphs_over(vec![river()]);
        let with_lake = fixtures::water_graphs();
        assert_eq!(
            with_lake
                .layer()
                .intersections(D, BELOW_LAKE, Precision::Exact)
                .len(),
            3,
            "one river crossing and two lake crossings"
        );

        let great_circle = Metric::GreatCircle.distance(D, BELOW_LAKE).meters();
        let fewer = WaterGraphEstimator::new(&river_only, Metric::FlatEarth, false)
            .estimate(D, BELOW_LAKE)
            .unwrap();
        let more = WaterGraphEstimator::new(&with_lake, Metric::FlatEarth, false)
            .estimate(D, BELOW_LAKE)
            .unwrap();

        assert!(fewer.distance.meters() >= great_circle);
        assert!(
            more.distance.meters() >= fewer.distance.meters(),
            "{} < {}",
            more.distance,
            fewer.distance
        );
    }

    #[test]
    fn identical_points_are_zero() {
        let artifacts = fixtures::water_graphs();
        let estimator = WaterGraphEstimator::new(&artifacts, Metric::FlatEarth, true);
        assert!(estimator.estimate(D, D).unwrap().distance.is_zero());
    }
}
