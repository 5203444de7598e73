//! Undirected weighted graph keyed by [`GeoPoint`] vertices.

use std::collections::HashMap;

use geo::LineString;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use water_route_models::{DistanceEstimate, GeoPoint};
use water_route_spatial::Metric;

/// Simple graph (no self-loops, no parallel edges) with edge weights in
/// meters.
#[derive(Debug, Clone, Default)]
pub struct WaterGraph {
    graph: UnGraph<GeoPoint, f64>,
    nodes: HashMap<GeoPoint, NodeIndex>,
}

impl WaterGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over the consecutive vertices of `ring`, weighted by
    /// `metric`, optionally scaled by the circuity factor.
    #[must_use]
    pub fn from_ring(ring: &LineString<f64>, metric: Metric, circuity: bool) -> Self {
        let mut graph = Self::new();
        for line in ring.lines() {
            let a = GeoPoint::from(line.start);
            let b = GeoPoint::from(line.end);
            graph.add_edge(a, b, metric.weighted(a, b, circuity));
        }
        graph
    }

    /// Node of `point`, inserting it first if needed.
    pub fn add_vertex(&mut self, point: GeoPoint) -> NodeIndex {
        *self
            .nodes
            .entry(point)
            .or_insert_with(|| self.graph.add_node(point))
    }

    /// Adds the edge `a - b`. Self-loops and edges that already exist are
    /// ignored; returns whether an edge was added.
    pub fn add_edge(&mut self, a: GeoPoint, b: GeoPoint, weight: DistanceEstimate) -> bool {
        if a == b {
            return false;
        }
        let na = self.add_vertex(a);
        let nb = self.add_vertex(b);
        if self.graph.find_edge(na, nb).is_some() {
            return false;
        }
        self.graph.add_edge(na, nb, weight.meters());
        true
    }

    /// Copies every vertex and edge of `other` into this graph, keeping
    /// the stored weights.
    pub fn merge(&mut self, other: &Self) {
        for point in other.graph.node_weights() {
            self.add_vertex(*point);
        }
        for edge in other.graph.edge_references() {
            self.add_edge(
                other.graph[edge.source()],
                other.graph[edge.target()],
                DistanceEstimate::from_meters(*edge.weight()),
            );
        }
    }

    /// Node of `point`, if it is a vertex.
    #[must_use]
    pub fn node(&self, point: GeoPoint) -> Option<NodeIndex> {
        self.nodes.get(&point).copied()
    }

    /// Weight of the edge `a - b`, if present.
    #[must_use]
    pub fn weight(&self, a: GeoPoint, b: GeoPoint) -> Option<DistanceEstimate> {
        let edge = self.graph.find_edge(self.node(a)?, self.node(b)?)?;
        Some(DistanceEstimate::from_meters(self.graph[edge]))
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub const fn inner(&self) -> &UnGraph<GeoPoint, f64> {
        &self.graph
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn ignores_self_loops_and_duplicates() {
        let mut g = WaterGraph::new();
        let a = p(49.79, 9.90);
        let b = p(49.79, 9.93);
        assert!(g.add_edge(a, b, DistanceEstimate::from_meters(10.0)));
        assert!(!g.add_edge(b, a, DistanceEstimate::from_meters(20.0)));
        assert!(!g.add_edge(a, a, DistanceEstimate::from_meters(1.0)));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(b, a), Some(DistanceEstimate::from_meters(10.0)));
    }

    #[test]
    fn ring_graph_is_a_cycle() {
        let ring = LineString::from(vec![
            (9.90, 49.790),
            (9.93, 49.790),
            (9.93, 49.792),
            (9.90, 49.792),
            (9.90, 49.790),
        ]);
        let g = WaterGraph::from_ring(&ring, Metric::FlatEarth, false);
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 4);

        let side = g.weight(p(49.790, 9.93), p(49.792, 9.93)).unwrap();
        assert!((side.meters() - 222.4).abs() < 1.0, "got {side}");
    }

    #[test]
    fn circuity_scales_boundary_edges() {
        let ring = LineString::from(vec![(0.0, 0.0), (0.01, 0.0), (0.0, 0.01), (0.0, 0.0)]);
        let plain = WaterGraph::from_ring(&ring, Metric::FlatEarth, false);
        let scaled = WaterGraph::from_ring(&ring, Metric::FlatEarth, true);
        let a = p(0.0, 0.0);
        let b = p(0.0, 0.01);
        let ratio = scaled.weight(a, b).unwrap().meters() / plain.weight(a, b).unwrap().meters();
        assert!((ratio - 1.32).abs() < 1e-9);
    }

    #[test]
    fn merge_keeps_stored_weights() {
        let mut a = WaterGraph::new();
        a.add_edge(p(0.0, 0.0), p(0.0, 1.0), DistanceEstimate::from_meters(5.0));
        let mut b = WaterGraph::new();
        b.add_edge(p(0.0, 1.0), p(0.0, 2.0), DistanceEstimate::from_meters(7.0));
        b.add_edge(p(0.0, 0.0), p(0.0, 1.0), DistanceEstimate::from_meters(99.0));

        a.merge(&b);
        assert_eq!(a.vertex_count(), 3);
        assert_eq!(a.edge_count(), 2);
        assert_eq!(a.weight(p(0.0, 0.0), p(0.0, 1.0)), Some(DistanceEstimate::from_meters(5.0)));
    }
}
