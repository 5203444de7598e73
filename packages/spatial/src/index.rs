//! R-tree over water-area envelopes.

use geo::Rect;
use rstar::{AABB, RTree, RTreeObject};
use water_route_models::WaterArea;

/// A water-area envelope stored in the R-tree, keyed by its position in
/// the owning layer.
struct AreaEntry {
    area: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for AreaEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Rectangle-range index mapping envelopes to water-area positions.
///
/// Built once per preprocessing artifact and only read afterwards.
pub struct WaterAreaIndex {
    tree: RTree<AreaEntry>,
}

impl WaterAreaIndex {
    /// Bulk-loads an index over `areas`; entry `i` refers to `areas[i]`.
    #[must_use]
    pub fn build(areas: &[WaterArea]) -> Self {
        let entries = areas
            .iter()
            .enumerate()
            .map(|(area, water)| AreaEntry {
                area,
                envelope: rect_envelope(water.envelope()),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Positions of every area whose envelope intersects `rect`, ascending.
    #[must_use]
    pub fn candidates(&self, rect: Rect<f64>) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|entry| entry.area)
            .collect();
        found.sort_unstable();
        found
    }

    /// Number of indexed areas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no areas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
