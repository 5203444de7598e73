//! Bidirectional Dijkstra over undirected graphs with non-negative
//! weights.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// A shortest path and its length.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// Sum of edge weights.
    pub distance: f64,
    /// Nodes from source to target, both included.
    pub nodes: Vec<NodeIndex>,
}

struct Side {
    dist: Vec<f64>,
    parent: Vec<Option<NodeIndex>>,
    heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeIndex)>>,
}

impl Side {
    fn new(n: usize, origin: NodeIndex) -> Self {
        let mut dist = vec![f64::INFINITY; n];
        dist[origin.index()] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), origin)));
        Self {
            dist,
            parent: vec![None; n],
            heap,
        }
    }

    fn top(&self) -> f64 {
        self.heap
            .peek()
            .map_or(f64::INFINITY, |Reverse((d, _))| d.into_inner())
    }
}

/// Shortest path from `source` to `target`, searching from both ends at
/// once. `None` if `target` is unreachable.
#[must_use]
pub fn bidirectional_dijkstra<N, E>(
    graph: &UnGraph<N, E>,
    source: NodeIndex,
    target: NodeIndex,
    weight: impl Fn(&E) -> f64,
) -> Option<ShortestPath> {
    let n = graph.node_count();
    if source.index() >= n || target.index() >= n {
        return None;
    }
    if source == target {
        return Some(ShortestPath {
            distance: 0.0,
            nodes: vec![source],
        });
    }

    let mut forward = Side::new(n, source);
    let mut backward = Side::new(n, target);
    let mut best = f64::INFINITY;
    let mut meeting: Option<NodeIndex> = None;

    while !forward.heap.is_empty() && !backward.heap.is_empty() {
        if forward.top() + backward.top() >= best {
            break;
        }

        let (side, other) = if forward.top() <= backward.top() {
            (&mut forward, &backward)
        } else {
            (&mut backward, &forward)
        };

        let Some(Reverse((d, u))) = side.heap.pop() else {
            break;
        };
        let d = d.into_inner();
        if d > side.dist[u.index()] {
            continue;
        }

        for edge in graph.edges(u) {
            let v = if edge.source() == u {
                edge.target()
            } else {
                edge.source()
            };
            let candidate = d + weight(edge.weight());
            if candidate < side.dist[v.index()] {
                side.dist[v.index()] = candidate;
                side.parent[v.index()] = Some(u);
                side.heap.push(Reverse((OrderedFloat(candidate), v)));
            }
            let through = side.dist[v.index()] + other.dist[v.index()];
            if through < best {
                best = through;
                meeting = Some(v);
            }
        }
    }

    let meeting = meeting?;

    let mut nodes = vec![meeting];
    let mut cursor = meeting;
    while let Some(p) = forward.parent[cursor.index()] {
        nodes.push(p);
        cursor = p;
    }
    nodes.reverse();
    cursor = meeting;
    while let Some(p) = backward.parent[cursor.index()] {
        nodes.push(p);
        cursor = p;
    }

    Some(ShortestPath {
        distance: best,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use petgraph::algo::dijkstra;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn run(graph: &UnGraph<(), f64>, s: usize, t: usize) -> Option<ShortestPath> {
        bidirectional_dijkstra(graph, NodeIndex::new(s), NodeIndex::new(t), |w| *w)
    }

    #[test]
    fn finds_cheaper_detour() {
        let mut g = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..4).map(|_| g.add_node(())).collect();
        g.add_edge(n[0], n[3], 10.0);
        g.add_edge(n[0], n[1], 2.0);
        g.add_edge(n[1], n[2], 2.0);
        g.add_edge(n[2], n[3], 2.0);

        let path = run(&g, 0, 3).unwrap();
        assert!((path.distance - 6.0).abs() < 1e-12);
        assert_eq!(path.nodes, n);
    }

    #[test]
    fn unreachable_target_is_none() {
        let mut g = UnGraph::<(), f64>::new_undirected();
        let a = g.add_node(());
        let b = g.add_node(());
        let c = g.add_node(());
        g.add_edge(a, b, 1.0);
        assert!(run(&g, a.index(), c.index()).is_none());
    }

    #[test]
    fn source_equal_to_target_is_empty_path() {
        let mut g = UnGraph::<(), f64>::new_undirected();
        let a = g.add_node(());
        let path = run(&g, a.index(), a.index()).unwrap();
        assert!(path.distance.abs() < f64::EPSILON);
        assert_eq!(path.nodes, vec![a]);
    }

    #[test]
    fn agrees_with_unidirectional_dijkstra_on_random_graphs() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..20 {
            let mut g = UnGraph::<(), f64>::new_undirected();
            let nodes: Vec<_> = (0..30).map(|_| g.add_node(())).collect();
            for _ in 0..60 {
                let a = nodes[rng.random_range(0..nodes.len())];
                let b = nodes[rng.random_range(0..nodes.len())];
                if a != b {
                    g.add_edge(a, b, rng.random_range(1.0..100.0));
                }
            }

            let reference = dijkstra(&g, nodes[0], None, |e| *e.weight());
            for &t in &nodes[1..] {
                let got = run(&g, 0, t.index());
                match reference.get(&t) {
                    Some(&expected) => {
                        let got = got.expect("reachable target must have a path");
                        assert!((got.distance - expected).abs() < 1e-9);
                        assert_eq!(got.nodes.first(), Some(&nodes[0]));
                        assert_eq!(got.nodes.last(), Some(&t));
                    }
                    None => assert!(got.is_none()),
                }
            }
        }
    }
}
