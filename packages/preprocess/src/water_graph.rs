//! Boundary graphs of ring-split water areas for the water-graph
//! heuristic.

use geo::{Line, LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use water_route_models::{Bridge, GeoPoint, Street, WaterArea};
use water_route_spatial::geometry::{self, planar_distance_sq};
use water_route_spatial::{Metric, WaterLayer};

use crate::association::{associate, exterior_rings_only, streets_to_bridges};
use crate::graph::WaterGraph;
use crate::{PreprocessConfig, merger, splitter};

/// Query-time data of one sub-area.
#[derive(Debug, Clone)]
pub struct SubArea {
    /// Graph over the simplified boundary.
    pub graph: WaterGraph,
    /// Boundary segments of the simplified polygon.
    pub edges: Vec<Line<f64>>,
    /// Boundary vertices where a bridge leaves this sub-area.
    pub bridge_vertices: Vec<GeoPoint>,
}

/// Sub-areas and their graphs. Position `i` of [`WaterGraphArtifacts::sub_area`]
/// belongs to area `i` of the layer.
pub struct WaterGraphArtifacts {
    layer: WaterLayer,
    sub_areas: Vec<SubArea>,
    metric: Metric,
}

impl WaterGraphArtifacts {
    #[must_use]
    pub const fn layer(&self) -> &WaterLayer {
        &self.layer
    }

    /// Metric the boundary edges are weighted with.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Graph, edges and bridge vertices of the area at `position`.
    #[must_use]
    pub fn sub_area(&self, position: usize) -> Option<&SubArea> {
        self.sub_areas.get(position)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sub_areas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sub_areas.is_empty()
    }
}

/// Runs the water-graph pipeline.
///
/// Keeps areas that have a bridge or are larger than
/// [`PreprocessConfig::important_area_sq_m`], splits every ring at its
/// bridges and builds one boundary graph per simplified sub-area.
#[must_use]
pub fn preprocess(
    areas: Vec<WaterArea>,
    streets: Vec<Street>,
    config: &PreprocessConfig,
) -> WaterGraphArtifacts {
    let areas = exterior_rings_only(areas);
    let raw = streets_to_bridges(streets);
    let associated = associate(&areas, &raw);
    let total = areas.len();

    let built: Vec<(WaterArea, SubArea)> = areas
        .into_par_iter()
        .zip(associated)
        .filter(|(area, bridges)| {
            !bridges.is_empty() || geometry::area_sq_m(area.geometry()) > config.important_area_sq_m
        })
        .flat_map_iter(|(area, bridges)| {
            let merged = if bridges.is_empty() {
                Vec::new()
            } else {
                merger::merge(area.name(), &bridges)
            };
            build_sub_areas(&area, &merged, config)
        })
        .collect();

    let (sub_areas, data): (Vec<WaterArea>, Vec<SubArea>) = built.into_iter().unzip();
    let simplified = sub_areas.iter().map(|a| a.geometry().clone()).collect();
    let layer = WaterLayer::from_parts(sub_areas, simplified);

    log::info!(
        "Water-graph preprocessing done: {} sub-areas from {total} water areas",
        layer.len()
    );

    WaterGraphArtifacts {
        layer,
        sub_areas: data,
        metric: config.graph_metric,
    }
}

fn build_sub_areas(
    area: &WaterArea,
    bridges: &[Bridge],
    config: &PreprocessConfig,
) -> Vec<(WaterArea, SubArea)> {
    let mut out = Vec::new();

    for (k, sub) in splitter::split_area(area, bridges).into_iter().enumerate() {
        let Some(polygon) = geometry::repair(Polygon::new(sub.ring, Vec::new())) else {
            log::warn!("Sub-area {k} of {} has no area left, dropping", area.name());
            continue;
        };
        let simple = geometry::simplify(&MultiPolygon(vec![polygon]), config.simplify_tolerance);
        let Some(boundary) = simple.0.first().map(|p| p.exterior().clone()) else {
            continue;
        };

        let mut bridge_vertices: Vec<GeoPoint> = sub
            .shortcuts_taken
            .iter()
            .filter_map(|&v| nearest_boundary_vertex(&boundary, v))
            .collect();
        bridge_vertices.sort_unstable();
        bridge_vertices.dedup();

        let graph =
            WaterGraph::from_ring(&boundary, config.graph_metric, config.circuity_in_graph);
        let edges = boundary.lines().collect();

        out.push((
            WaterArea::new(format!("{}#{k}", area.name()), simple),
            SubArea {
                graph,
                edges,
                bridge_vertices,
            },
        ));
    }

    out
}

fn nearest_boundary_vertex(boundary: &LineString<f64>, point: GeoPoint) -> Option<GeoPoint> {
    let target: geo::Point<f64> = point.into();
    boundary
        .0
        .iter()
        .min_by(|a, b| {
            planar_distance_sq((**a).into(), target).total_cmp(&planar_distance_sq((**b).into(), target))
        })
        .map(|c| GeoPoint::from(*c))
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::fixtures;

    #[test]
    fn river_becomes_two_rectangles_with_bridge_vertices() {
        let artifacts = preprocess(
            vec![fixtures::river()],
            vec![fixtures::bridge_street()],
            &PreprocessConfig::default(),
        );
        assert_eq!(artifacts.len(), 2);

        let west = artifacts.sub_area(0).unwrap();
        assert_eq!(west.graph.vertex_count(), 4);
        assert_eq!(west.edges.len(), 4);
        assert_eq!(west.bridge_vertices.len(), 1);
        assert!((west.bridge_vertices[0].lon - 9.93).abs() < 1e-9);
        assert!((west.bridge_vertices[0].lat - 49.790).abs() < 1e-9);

        let east = artifacts.sub_area(1).unwrap();
        assert_eq!(east.bridge_vertices.len(), 1);
        assert!((east.bridge_vertices[0].lat - 49.792).abs() < 1e-9);
    }

    #[test]
    fn unimportant_bridgeless_ponds_are_dropped() {
        let pond = WaterArea::new(
            "Tuempel",
            MultiPolygon(vec![polygon![
                (x: 10.0, y: 50.0),
                (x: 10.0005, y: 50.0),
                (x: 10.0005, y: 50.0005),
                (x: 10.0, y: 50.0005),
            ]]),
        );
        let lake = WaterArea::new(
            "See",
            MultiPolygon(vec![polygon![
                (x: 10.1, y: 50.0),
                (x: 10.11, y: 50.0),
                (x: 10.11, y: 50.01),
                (x: 10.1, y: 50.01),
            ]]),
        );
        let artifacts = preprocess(vec![pond, lake], Vec::new(), &PreprocessConfig::default());
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts.layer().area(0).name(), "See#0");
        assert!(artifacts.sub_area(0).unwrap().bridge_vertices.is_empty());
    }

    #[test]
    fn boundary_edges_use_the_configured_metric() {
        let config = PreprocessConfig {
            graph_metric: Metric::GreatCircle,
            ..PreprocessConfig::default()
        };
        let artifacts = preprocess(
            vec![fixtures::river()],
            vec![fixtures::bridge_street()],
            &config,
        );
        assert_eq!(artifacts.metric(), Metric::GreatCircle);

        let west = artifacts.sub_area(0).unwrap();
        let edge = west.edges[0];
        let (a, b) = (GeoPoint::from(edge.start), GeoPoint::from(edge.end));
        assert_eq!(
            west.graph.weight(a, b),
            Some(Metric::GreatCircle.distance(a, b))
        );
    }

    #[test]
    fn sub_area_layer_uses_simplified_geometry_as_exact() {
        let artifacts = preprocess(
            vec![fixtures::river()],
            vec![fixtures::bridge_street()],
            &PreprocessConfig::default(),
        );
        let layer = artifacts.layer();
        assert_eq!(
            layer.geometry(0, water_route_spatial::Precision::Exact),
            layer.simplified(0)
        );
    }
}
