//! Segment / water-area intersection engine.
//!
//! A straight segment may enter and leave a concave area several times.
//! Routing only cares about where it first enters and where it finally
//! leaves, so each area contributes at most two fragments: the first and
//! the last piece of the clipped segment, both oriented away from the
//! segment start.

use geo::{BooleanOps, Intersects, Line, LineString, MultiLineString, Point};
use rayon::prelude::*;
use water_route_models::{DistanceEstimate, GeoPoint};

use crate::geometry::planar_distance_sq;
use crate::layer::{Precision, WaterLayer};
use crate::metric::Metric;

/// Default minimum distance from the start below which an intersection is
/// treated as already handled on later search steps.
pub const DEFAULT_MIN_GAP: DistanceEstimate = DistanceEstimate::from_meters(5.0);

/// One piece of a segment lying inside a water area.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Clipped piece, oriented from the segment start.
    pub line: LineString<f64>,
    /// Position of the water area in its layer.
    pub area: usize,
}

impl Intersection {
    /// Point where the segment enters the area.
    #[must_use]
    pub fn entry(&self) -> GeoPoint {
        GeoPoint::from(self.line.0[0])
    }

    /// Point where the segment leaves the area.
    #[must_use]
    pub fn exit(&self) -> GeoPoint {
        GeoPoint::from(self.line.0[self.line.0.len() - 1])
    }
}

impl WaterLayer {
    /// Intersections of the segment `start -> dest` with every area of the
    /// layer whose envelope it touches.
    #[must_use]
    pub fn intersections(
        &self,
        start: GeoPoint,
        dest: GeoPoint,
        precision: Precision,
    ) -> Vec<Intersection> {
        if start == dest {
            return Vec::new();
        }
        let candidates = self.candidates(start, dest);
        self.intersections_among(start, dest, precision, &candidates)
    }

    /// Intersections of `start -> dest` with the given candidate areas only.
    ///
    /// Candidates are tested against their simplified geometry; only those
    /// that pass are clipped at `precision`.
    #[must_use]
    pub fn intersections_among(
        &self,
        start: GeoPoint,
        dest: GeoPoint,
        precision: Precision,
        candidates: &[usize],
    ) -> Vec<Intersection> {
        if start == dest {
            return Vec::new();
        }

        let segment = Line::new(geo::Coord::from(start), geo::Coord::from(dest));
        let clip_input = MultiLineString(vec![LineString::from(segment)]);
        let origin: Point<f64> = start.into();

        candidates
            .par_iter()
            .flat_map_iter(|&area| {
                if !self.simplified(area).intersects(&segment) {
                    return Vec::new();
                }

                let mut fragments: Vec<LineString<f64>> = self
                    .geometry(area, precision)
                    .clip(&clip_input, false)
                    .0
                    .into_iter()
                    .filter(|f| f.0.len() >= 2)
                    .map(|f| orient_from(f, origin))
                    .collect();
                fragments.sort_by(|a, b| {
                    planar_distance_sq(a.0[0].into(), origin)
                        .total_cmp(&planar_distance_sq(b.0[0].into(), origin))
                });

                let last = fragments.pop();
                let first = if fragments.is_empty() {
                    None
                } else {
                    Some(fragments.swap_remove(0))
                };

                first
                    .into_iter()
                    .chain(last)
                    .map(|line| Intersection { line, area })
                    .collect()
            })
            .collect()
    }

    /// Whether `start -> dest` crosses any area of the layer.
    #[must_use]
    pub fn crosses(&self, start: GeoPoint, dest: GeoPoint, precision: Precision) -> bool {
        !self.intersections(start, dest, precision).is_empty()
    }
}

fn orient_from(mut line: LineString<f64>, origin: Point<f64>) -> LineString<f64> {
    let head = planar_distance_sq(line.0[0].into(), origin);
    let tail = planar_distance_sq(line.0[line.0.len() - 1].into(), origin);
    if tail < head {
        line.0.reverse();
    }
    line
}

/// Orders intersections by the flat-earth distance from `start` to their
/// exit point.
///
/// From the second search step on (`step > 1`), intersections whose exit
/// lies within `min_gap` of `start` are dropped: they belong to a crossing
/// the search has just made.
#[must_use]
pub fn sort_by_distance_from_start(
    start: GeoPoint,
    intersections: Vec<Intersection>,
    step: usize,
    min_gap: DistanceEstimate,
) -> Vec<Intersection> {
    let mut keyed: Vec<(DistanceEstimate, Intersection)> = intersections
        .into_iter()
        .map(|i| (Metric::FlatEarth.distance(start, i.exit()), i))
        .filter(|(d, _)| step <= 1 || *d > min_gap)
        .collect();

    keyed.sort_by(|(da, a), (db, b)| {
        da.meters()
            .total_cmp(&db.meters())
            .then_with(|| a.area.cmp(&b.area))
            .then_with(|| a.entry().cmp(&b.entry()))
    });

    keyed.into_iter().map(|(_, i)| i).collect()
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, polygon};
    use water_route_models::WaterArea;

    use super::*;

    fn river() -> WaterLayer {
        WaterLayer::new(
            vec![WaterArea::new(
                "river",
                MultiPolygon(vec![polygon![
                    (x: 9.90, y: 49.790),
                    (x: 9.96, y: 49.790),
                    (x: 9.96, y: 49.792),
                    (x: 9.90, y: 49.792),
                ]]),
            )],
            0.0001,
        )
    }

    /// A "U" shaped lake open to the north; a west-east segment through the
    /// arms clips it twice.
    fn u_lake() -> WaterLayer {
        WaterLayer::new(
            vec![WaterArea::new(
                "u",
                MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0),
                    (x: 3.0, y: 0.0),
                    (x: 3.0, y: 3.0),
                    (x: 2.0, y: 3.0),
                    (x: 2.0, y: 1.0),
                    (x: 1.0, y: 1.0),
                    (x: 1.0, y: 3.0),
                    (x: 0.0, y: 3.0),
                ]]),
            )],
            0.0001,
        )
    }

    #[test]
    fn segment_across_river_has_one_fragment() {
        let layer = river();
        let start = GeoPoint::new(49.785, 9.925);
        let dest = GeoPoint::new(49.797, 9.928);
        let found = layer.intersections(start, dest, Precision::Exact);
        assert_eq!(found.len(), 1);
        assert!((found[0].entry().lat - 49.790).abs() < 1e-9);
        assert!((found[0].exit().lat - 49.792).abs() < 1e-9);
    }

    #[test]
    fn segment_beside_river_has_none() {
        let layer = river();
        let start = GeoPoint::new(49.785, 9.925);
        let dest = GeoPoint::new(49.786, 9.950);
        assert!(layer.intersections(start, dest, Precision::Simplified).is_empty());
        assert!(!layer.crosses(start, dest, Precision::Exact));
    }

    #[test]
    fn concave_area_keeps_first_and_last_piece() {
        let layer = u_lake();
        let start = GeoPoint::new(2.0, -1.0);
        let dest = GeoPoint::new(2.0, 4.0);
        let found = layer.intersections(start, dest, Precision::Exact);
        assert_eq!(found.len(), 2);
        assert!((found[0].entry().lon - 0.0).abs() < 1e-9);
        assert!((found[1].exit().lon - 3.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_segment_orients_from_its_own_start() {
        let layer = river();
        let start = GeoPoint::new(49.797, 9.928);
        let dest = GeoPoint::new(49.785, 9.925);
        let found = layer.intersections(start, dest, Precision::Exact);
        assert!((found[0].entry().lat - 49.792).abs() < 1e-9);
    }

    #[test]
    fn simplified_geometry_gates_exact_clipping() {
        let exact = river();
        let offset = MultiPolygon(vec![polygon![
            (x: 9.90, y: 49.800),
            (x: 9.96, y: 49.800),
            (x: 9.96, y: 49.802),
            (x: 9.90, y: 49.802),
        ]]);
        let layer = WaterLayer::from_parts(exact.areas().to_vec(), vec![offset]);

        let start = GeoPoint::new(49.785, 9.925);
        let below = GeoPoint::new(49.797, 9.928);
        assert!(layer.intersections(start, below, Precision::Exact).is_empty());

        let above = GeoPoint::new(49.805, 9.928);
        let found = layer.intersections(start, above, Precision::Exact);
        assert_eq!(found.len(), 1);
        assert!((found[0].entry().lat - 49.790).abs() < 1e-9);
    }

    #[test]
    fn sorting_filters_near_start_after_first_step() {
        let at = GeoPoint::new(49.792, 9.93);
        let near = Intersection {
            line: LineString::from(vec![(9.93, 49.790), (9.93, 49.792)]),
            area: 0,
        };
        let far = Intersection {
            line: LineString::from(vec![(9.93, 49.795), (9.93, 49.797)]),
            area: 1,
        };
        let items = vec![far.clone(), near.clone()];

        let first_step = sort_by_distance_from_start(at, items.clone(), 1, DEFAULT_MIN_GAP);
        assert_eq!(first_step, vec![near, far.clone()]);

        let later = sort_by_distance_from_start(at, items, 2, DEFAULT_MIN_GAP);
        assert_eq!(later, vec![far]);
    }
}
