//! Iterative-deepening depth-first enumeration.
//!
//! Depth `d = 1..=max_depth` collects the paths with exactly `d` edges, each
//! pass walking adjacency in edge-list order. The output is therefore a prefix
//! of a single canonical ordering (by hop count, then adjacency), so raising
//! `max_depth` or `max_paths` can only append paths.

use tracing::{debug, trace};

use super::dijkstra::IndexPath;
use super::search::SearchBounds;
use crate::domain::Graph;

/// Tolerance for floating-point comparisons against the time limit.
const TIME_EPSILON: f64 = 1e-9;

struct DfsSearch<'a> {
    graph: &'a Graph,
    bounds: &'a SearchBounds,
    target: usize,
    /// Travel time from each node to the target (admissible lower bound).
    dist_to_target: &'a [f64],
    /// Edge count from each node to the target (admissible lower bound).
    hops_to_target: &'a [usize],
    on_path: Vec<bool>,
    nodes: Vec<usize>,
    edges: Vec<usize>,
    found: Vec<IndexPath>,
    expansions: usize,
    exhausted: bool,
}

impl DfsSearch<'_> {
    fn done(&self) -> bool {
        self.exhausted || self.found.len() >= self.bounds.max_paths
    }

    /// Extend the current partial path with exactly `remaining` more edges.
    fn extend(&mut self, node: usize, remaining: usize, cost: f64) {
        if self.expansions >= self.bounds.max_expansions {
            self.exhausted = true;
            return;
        }
        self.expansions += 1;

        let graph = self.graph;
        for &e in graph.outgoing(node) {
            let (_, next) = graph.endpoints(e);
            if !self.bounds.allow_cycles && self.on_path[next] {
                continue;
            }

            let next_cost = cost + graph.edge(e).travel_time;
            // Unreachable nodes carry an infinite bound and are cut here
            if next_cost + self.dist_to_target[next] > self.bounds.time_limit + TIME_EPSILON {
                continue;
            }

            let left = remaining - 1;
            if next == self.target {
                // Paths end at their first arrival at the target
                if left == 0 {
                    self.record(e, next, next_cost);
                    if self.done() {
                        return;
                    }
                }
                continue;
            }

            if self.hops_to_target[next] > left {
                continue;
            }

            self.push(e, next);
            self.extend(next, left, next_cost);
            self.pop(next);

            if self.done() {
                return;
            }
        }
    }

    fn record(&mut self, edge: usize, target: usize, cost: f64) {
        let mut nodes = self.nodes.clone();
        nodes.push(target);
        let mut edges = self.edges.clone();
        edges.push(edge);
        trace!(hops = edges.len(), cost, "DFS found path");
        self.found.push(IndexPath { nodes, edges, cost });
    }

    fn push(&mut self, edge: usize, node: usize) {
        self.nodes.push(node);
        self.edges.push(edge);
        self.on_path[node] = true;
    }

    fn pop(&mut self, node: usize) {
        self.nodes.pop();
        self.edges.pop();
        // With cycles allowed a node may appear twice; keep the flag while it is still on the path
        self.on_path[node] = self.nodes.contains(&node);
    }
}

/// Enumerate paths from `source` to `target` depth by depth.
///
/// Returns the paths found and the number of node expansions performed.
pub(super) fn enumerate(
    graph: &Graph,
    source: usize,
    target: usize,
    bounds: &SearchBounds,
    dist_to_target: &[f64],
    hops_to_target: &[usize],
) -> (Vec<IndexPath>, usize) {
    let mut search = DfsSearch {
        graph,
        bounds,
        target,
        dist_to_target,
        hops_to_target,
        on_path: vec![false; graph.node_count()],
        nodes: vec![source],
        edges: Vec::new(),
        found: Vec::new(),
        expansions: 0,
        exhausted: false,
    };
    search.on_path[source] = true;

    // A simple path has at most node_count - 1 edges
    let depth_cap = if bounds.allow_cycles {
        bounds.max_depth
    } else {
        bounds.max_depth.min(graph.node_count().saturating_sub(1))
    };

    let min_depth = hops_to_target[source].max(1);
    for depth in min_depth..=depth_cap {
        search.extend(source, depth, 0.0);
        debug!(
            depth,
            found = search.found.len(),
            expansions = search.expansions,
            "DFS depth complete"
        );
        if search.done() {
            break;
        }
    }

    if search.exhausted {
        debug!(
            max_expansions = bounds.max_expansions,
            "DFS stopped at expansion budget"
        );
    }

    (search.found, search.expansions)
}
