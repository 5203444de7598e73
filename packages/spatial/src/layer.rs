//! A set of water areas with their simplified geometry and envelope index.

use geo::{MultiPolygon, Rect};
use rayon::prelude::*;
use water_route_models::{GeoPoint, WaterArea};

use crate::geometry;
use crate::index::WaterAreaIndex;

/// Which geometry of an area intersection tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// Tolerance-simplified geometry, computed once per layer.
    Simplified,
    /// The geometry as delivered by preprocessing.
    Exact,
}

/// Immutable water areas plus everything needed to intersect them with
/// straight segments.
pub struct WaterLayer {
    areas: Vec<WaterArea>,
    simplified: Vec<MultiPolygon<f64>>,
    index: WaterAreaIndex,
}

impl WaterLayer {
    /// Simplifies every area with `tolerance` and indexes the envelopes.
    #[must_use]
    pub fn new(areas: Vec<WaterArea>, tolerance: f64) -> Self {
        let simplified = areas
            .par_iter()
            .map(|area| geometry::simplify(area.geometry(), tolerance))
            .collect();
        Self::from_parts(areas, simplified)
    }

    /// Builds a layer from areas whose simplified geometry is already known.
    /// Entry `i` of `simplified` belongs to `areas[i]`.
    #[must_use]
    pub fn from_parts(areas: Vec<WaterArea>, simplified: Vec<MultiPolygon<f64>>) -> Self {
        debug_assert_eq!(areas.len(), simplified.len());
        let index = WaterAreaIndex::build(&areas);
        Self {
            areas,
            simplified,
            index,
        }
    }

    /// All areas, in index order.
    #[must_use]
    pub fn areas(&self) -> &[WaterArea] {
        &self.areas
    }

    /// The area at `position`.
    #[must_use]
    pub fn area(&self, position: usize) -> &WaterArea {
        &self.areas[position]
    }

    /// Simplified geometry of the area at `position`.
    #[must_use]
    pub fn simplified(&self, position: usize) -> &MultiPolygon<f64> {
        &self.simplified[position]
    }

    /// Geometry of the area at `position` at the requested precision.
    #[must_use]
    pub fn geometry(&self, position: usize, precision: Precision) -> &MultiPolygon<f64> {
        match precision {
            Precision::Simplified => &self.simplified[position],
            Precision::Exact => self.areas[position].geometry(),
        }
    }

    /// Areas whose envelope overlaps the bounding rectangle of the segment.
    #[must_use]
    pub fn candidates(&self, start: GeoPoint, dest: GeoPoint) -> Vec<usize> {
        self.index
            .candidates(Rect::new(geo::Coord::from(start), geo::Coord::from(dest)))
    }

    /// Number of areas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether the layer holds no areas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
