//! Shortest-path primitives over graph indices.
//!
//! Everything here works on internal node and edge indices rather than
//! identifiers. Ties are broken by node index and adjacency order, so results
//! are deterministic for a given graph.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use crate::domain::{Graph, PathContiguityError, RoutePath};

/// A path expressed as graph indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexPath {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
    pub cost: f64,
}

impl IndexPath {
    /// Materialize as a validated `RoutePath`.
    pub fn to_route_path(
        &self,
        graph: &Graph,
        allow_cycles: bool,
    ) -> Result<RoutePath, PathContiguityError> {
        let nodes = self
            .nodes
            .iter()
            .map(|&n| graph.node_at(n).id.clone())
            .collect();
        let edges = self.edges.iter().map(|&e| graph.edge(e).clone()).collect();
        RoutePath::new(nodes, edges, allow_cycles)
    }

    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: usize,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, then by node index (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Travel time from every node to `target`, by reverse Dijkstra.
///
/// Unreachable nodes get `f64::INFINITY`.
pub(crate) fn distances_to(graph: &Graph, target: usize) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; graph.node_count()];
    let mut heap = BinaryHeap::new();

    dist[target] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: target,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if cost > dist[node] {
            continue;
        }
        for &e in graph.incoming(node) {
            let (prev, _) = graph.endpoints(e);
            let next_cost = cost + graph.edge(e).travel_time;
            if next_cost < dist[prev] {
                dist[prev] = next_cost;
                heap.push(State {
                    cost: next_cost,
                    node: prev,
                });
            }
        }
    }

    dist
}

/// Minimum number of edges from every node to `target`, by reverse BFS.
///
/// Unreachable nodes get `usize::MAX`.
pub(crate) fn hops_to(graph: &Graph, target: usize) -> Vec<usize> {
    let mut hops = vec![usize::MAX; graph.node_count()];
    let mut queue = VecDeque::new();

    hops[target] = 0;
    queue.push_back(target);

    while let Some(node) = queue.pop_front() {
        for &e in graph.incoming(node) {
            let (prev, _) = graph.endpoints(e);
            if hops[prev] == usize::MAX {
                hops[prev] = hops[node] + 1;
                queue.push_back(prev);
            }
        }
    }

    hops
}

/// Shortest path from `source` to `target` avoiding banned nodes and edges.
///
/// `expansions` is incremented once per settled node so callers can bound
/// total work across repeated searches.
pub(crate) fn shortest_path(
    graph: &Graph,
    source: usize,
    target: usize,
    banned_nodes: &[bool],
    banned_edges: &HashSet<usize>,
    expansions: &mut usize,
) -> Option<IndexPath> {
    if banned_nodes[source] || banned_nodes[target] {
        return None;
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut via_edge: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if cost > dist[node] {
            continue;
        }
        *expansions += 1;
        if node == target {
            break;
        }

        for &e in graph.outgoing(node) {
            if banned_edges.contains(&e) {
                continue;
            }
            let (_, next) = graph.endpoints(e);
            if banned_nodes[next] {
                continue;
            }
            let next_cost = cost + graph.edge(e).travel_time;
            if next_cost < dist[next] {
                dist[next] = next_cost;
                via_edge[next] = Some(e);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    if !dist[target].is_finite() {
        return None;
    }

    // Walk predecessors back from the target
    let mut edges = Vec::new();
    let mut nodes = vec![target];
    let mut current = target;
    while current != source {
        let e = via_edge[current]?;
        edges.push(e);
        current = graph.endpoints(e).0;
        nodes.push(current);
    }
    edges.reverse();
    nodes.reverse();

    Some(IndexPath {
        nodes,
        edges,
        cost: dist[target],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Edge, Node, NodeId};

    fn graph() -> Graph {
        Graph::new(
            ["A", "B", "C", "D", "E"]
                .iter()
                .map(|s| Node::bare(*s))
                .collect(),
            vec![
                Edge::bridge("A", "B", 300.0, 0.0, "1"),
                Edge::road("B", "C", 120.0, 0.0),
                Edge::road("A", "D", 400.0, 0.0),
                Edge::bridge("D", "C", 100.0, 0.0, "2"),
                Edge::road("C", "E", 10.0, 0.0),
            ],
        )
        .unwrap()
    }

    fn idx(g: &Graph, s: &str) -> usize {
        g.index_of(&NodeId::new(s)).unwrap()
    }

    #[test]
    fn reverse_distances() {
        let g = graph();
        let dist = distances_to(&g, idx(&g, "C"));
        assert_eq!(dist[idx(&g, "A")], 420.0);
        assert_eq!(dist[idx(&g, "D")], 100.0);
        assert_eq!(dist[idx(&g, "C")], 0.0);
        assert!(dist[idx(&g, "E")].is_infinite());
    }

    #[test]
    fn reverse_hops() {
        let g = graph();
        let hops = hops_to(&g, idx(&g, "E"));
        assert_eq!(hops[idx(&g, "A")], 3);
        assert_eq!(hops[idx(&g, "C")], 1);
    }

    #[test]
    fn shortest_path_and_bans() {
        let g = graph();
        let banned = vec![false; g.node_count()];
        let mut expansions = 0;

        let p = shortest_path(
            &g,
            idx(&g, "A"),
            idx(&g, "C"),
            &banned,
            &HashSet::new(),
            &mut expansions,
        )
        .unwrap();
        assert_eq!(p.cost, 420.0);
        assert_eq!(p.edges, vec![0, 1]);
        assert!(expansions > 0);

        let banned_edges: HashSet<usize> = [0].into_iter().collect();
        let p = shortest_path(
            &g,
            idx(&g, "A"),
            idx(&g, "C"),
            &banned,
            &banned_edges,
            &mut expansions,
        )
        .unwrap();
        assert_eq!(p.cost, 500.0);
        assert_eq!(p.nodes, vec![idx(&g, "A"), idx(&g, "D"), idx(&g, "C")]);
    }

    #[test]
    fn unreachable_returns_none() {
        let g = graph();
        let banned = vec![false; g.node_count()];
        let mut expansions = 0;
        assert!(
            shortest_path(
                &g,
                idx(&g, "E"),
                idx(&g, "A"),
                &banned,
                &HashSet::new(),
                &mut expansions
            )
            .is_none()
        );
    }

    #[test]
    fn converts_to_route_path() {
        let g = graph();
        let banned = vec![false; g.node_count()];
        let mut expansions = 0;
        let p = shortest_path(
            &g,
            idx(&g, "A"),
            idx(&g, "E"),
            &banned,
            &HashSet::new(),
            &mut expansions,
        )
        .unwrap();
        let route = p.to_route_path(&g, false).unwrap();
        assert_eq!(route.hop_count(), 3);
        assert_eq!(route.total_travel_time(), 430.0);
    }
}
