//! Water areas and bridges for the bridge-route heuristic.
//!
//! Two variants are produced from the same input: whole areas, and areas
//! ring-split at their bridges into smaller sub-areas that are cheaper to
//! intersect.

use geo::{BoundingRect, CoordsIter, Intersects, MultiPolygon, Polygon, Rect};
use rayon::prelude::*;
use water_route_models::{Bridge, Street, WaterArea};
use water_route_spatial::{WaterLayer, geometry};

use crate::association::{associate, exterior_rings_only, streets_to_bridges};
use crate::{PreprocessConfig, merger, splitter};

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A water layer where every area has at least one bridge.
pub struct BridgeRouteArtifacts {
    layer: WaterLayer,
    bridges: Vec<Vec<Bridge>>,
}

impl BridgeRouteArtifacts {
    /// Pairs a layer with the bridges of each of its areas (by position).
    #[must_use]
    pub fn new(layer: WaterLayer, bridges: Vec<Vec<Bridge>>) -> Self {
        debug_assert_eq!(layer.len(), bridges.len());
        Self { layer, bridges }
    }

    #[must_use]
    pub const fn layer(&self) -> &WaterLayer {
        &self.layer
    }

    /// Bridges of the area at `position`.
    #[must_use]
    pub fn bridges_of(&self, position: usize) -> &[Bridge] {
        self.bridges.get(position).map_or(&[], Vec::as_slice)
    }

    /// Total number of bridges over all areas.
    #[must_use]
    pub fn bridge_count(&self) -> usize {
        self.bridges.iter().map(Vec::len).sum()
    }
}

/// Both bridge-route variants.
pub struct BridgeRoutePreprocessing {
    /// Areas as delivered, with merged bridges.
    pub whole: BridgeRouteArtifacts,
    /// Areas ring-split at their bridges.
    pub split: BridgeRouteArtifacts,
}

/// Runs the bridge-route pipeline.
#[must_use]
pub fn preprocess(
    areas: Vec<WaterArea>,
    streets: Vec<Street>,
    config: &PreprocessConfig,
) -> BridgeRoutePreprocessing {
    let areas = exterior_rings_only(areas);
    let raw = streets_to_bridges(streets);
    let associated = associate(&areas, &raw);

    let bridged: Vec<(WaterArea, Vec<Bridge>)> = areas
        .into_par_iter()
        .zip(associated)
        .filter_map(|(area, segments)| {
            if segments.is_empty() {
                return None;
            }
            let merged = merger::merge(area.name(), &segments);
            (!merged.is_empty()).then_some((area, merged))
        })
        .collect();
    log::info!("{} water areas have bridges", bridged.len());

    let whole = artifacts(bridged.clone(), config.simplify_tolerance);
    let split = artifacts(split_all(&bridged, &raw, config), config.simplify_tolerance);

    log::info!(
        "Bridge-route preprocessing done: {} whole areas with {} bridges, {} sub-areas with {} bridges",
        whole.layer.len(),
        whole.bridge_count(),
        split.layer.len(),
        split.bridge_count()
    );

    BridgeRoutePreprocessing { whole, split }
}

fn artifacts(areas: Vec<(WaterArea, Vec<Bridge>)>, tolerance: f64) -> BridgeRouteArtifacts {
    let (areas, bridges): (Vec<WaterArea>, Vec<Vec<Bridge>>) = areas.into_iter().unzip();
    BridgeRouteArtifacts::new(WaterLayer::new(areas, tolerance), bridges)
}

fn split_all(
    bridged: &[(WaterArea, Vec<Bridge>)],
    raw: &[Bridge],
    config: &PreprocessConfig,
) -> Vec<(WaterArea, Vec<Bridge>)> {
    bridged
        .par_iter()
        .flat_map_iter(|(area, bridges)| split_one(area, bridges, raw, config))
        .collect()
}

fn split_one(
    area: &WaterArea,
    bridges: &[Bridge],
    raw: &[Bridge],
    config: &PreprocessConfig,
) -> Vec<(WaterArea, Vec<Bridge>)> {
    if area.geometry().coords_count() < config.min_split_vertices {
        return vec![(area.clone(), bridges.to_vec())];
    }

    let mut out = Vec::new();
    for (k, sub) in splitter::split_area(area, bridges).into_iter().enumerate() {
        let Some(polygon) = geometry::repair(Polygon::new(sub.ring, Vec::new())) else {
            log::warn!("Sub-area {k} of {} has no area left, dropping", area.name());
            continue;
        };
        let sub_area = WaterArea::new(format!("{}#{k}", area.name()), MultiPolygon(vec![polygon]));

        let mut nearby = nearby_bridges(&sub_area, raw, config.bridge_reassociation_m);
        nearby.extend(
            bridges
                .iter()
                .filter(|b| {
                    geometry::min_vertex_distance(b.line(), sub_area.geometry()).meters()
                        < config.parent_bridge_radius_m
                })
                .cloned(),
        );

        let merged = merger::merge(sub_area.name(), &nearby);
        if merged.is_empty() {
            log::debug!("Sub-area {} has no bridges, dropping", sub_area.name());
            continue;
        }
        out.push((sub_area, merged));
    }
    out
}

/// Raw bridge candidates with a vertex within `radius_m` of a boundary
/// vertex of `area`.
fn nearby_bridges(area: &WaterArea, raw: &[Bridge], radius_m: f64) -> Vec<Bridge> {
    let envelope = grow(area.envelope(), radius_m);
    raw.iter()
        .filter(|b| {
            b.line()
                .bounding_rect()
                .is_some_and(|rect| rect.intersects(&envelope))
        })
        .filter(|b| geometry::min_vertex_distance(b.line(), area.geometry()).meters() < radius_m)
        .cloned()
        .collect()
}

/// `rect` grown by at least `meters` on every side.
fn grow(rect: Rect<f64>, meters: f64) -> Rect<f64> {
    let max_lat = rect.min().y.abs().max(rect.max().y.abs()).min(89.0);
    let d_lat = meters / METERS_PER_DEGREE;
    let d_lon = d_lat / max_lat.to_radians().cos();
    Rect::new(
        geo::coord! { x: rect.min().x - d_lon, y: rect.min().y - d_lat },
        geo::coord! { x: rect.max().x + d_lon, y: rect.max().y + d_lat },
    )
}
