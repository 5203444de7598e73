//! KD-tree over snapped reference points.

use kiddo::{KdTree, SquaredEuclidean};
use water_route_models::GeoPoint;

/// 1-nearest-neighbour lookup over a fixed set of reference points, in
/// planar `(lon, lat)` space.
pub struct ReferencePointIndex {
    tree: KdTree<f64, 2>,
    points: Vec<GeoPoint>,
}

impl ReferencePointIndex {
    /// Builds the index. Exact duplicates are stored once.
    #[must_use]
    pub fn build(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        let mut points: Vec<GeoPoint> = points.into_iter().collect();
        points.sort_unstable();
        points.dedup();

        let mut tree: KdTree<f64, 2> = KdTree::with_capacity(points.len().max(1));
        for (i, p) in points.iter().enumerate() {
            tree.add(&p.to_xy(), i as u64);
        }

        Self { tree, points }
    }

    /// The reference point closest to `query`, or `None` when empty.
    #[must_use]
    pub fn nearest(&self, query: GeoPoint) -> Option<GeoPoint> {
        if self.points.is_empty() {
            return None;
        }
        let found = self.tree.nearest_one::<SquaredEuclidean>(&query.to_xy());
        usize::try_from(found.item)
            .ok()
            .and_then(|i| self.points.get(i))
            .copied()
    }

    /// Whether some reference point lies within `radius_deg` of `query`.
    #[must_use]
    pub fn has_within(&self, query: GeoPoint, radius_deg: f64) -> bool {
        self.nearest(query).is_some_and(|p| {
            let dx = p.lon - query.lon;
            let dy = p.lat - query.lat;
            dx.hypot(dy) <= radius_deg
        })
    }

    /// All indexed points, sorted.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_returns_closest_point() {
        let index = ReferencePointIndex::build([
            GeoPoint::new(49.79, 9.93),
            GeoPoint::new(49.80, 9.95),
            GeoPoint::new(49.75, 9.90),
        ]);
        assert_eq!(
            index.nearest(GeoPoint::new(49.801, 9.951)),
            Some(GeoPoint::new(49.80, 9.95))
        );
    }

    #[test]
    fn duplicates_are_collapsed() {
        let p = GeoPoint::new(49.79, 9.93);
        let index = ReferencePointIndex::build([p, p, p]);
        assert_eq!(index.len(), 1);
        assert!(index.has_within(GeoPoint::new(49.7901, 9.93), 0.001));
        assert!(!index.has_within(GeoPoint::new(49.9, 9.93), 0.001));
    }

    #[test]
    fn empty_index_has_no_nearest() {
        let index = ReferencePointIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.nearest(GeoPoint::new(0.0, 0.0)), None);
    }
}
