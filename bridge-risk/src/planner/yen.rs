//! Yen's K-shortest simple paths.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use super::dijkstra::{IndexPath, shortest_path};
use super::search::SearchBounds;
use crate::domain::Graph;

const TIME_EPSILON: f64 = 1e-9;

/// Candidate order: travel time, then edge sequence.
fn by_cost_then_edges(a: &IndexPath, b: &IndexPath) -> Ordering {
    a.cost
        .total_cmp(&b.cost)
        .then_with(|| a.edges.cmp(&b.edges))
}

fn within(bounds: &SearchBounds, path: &IndexPath) -> bool {
    path.hops() <= bounds.max_depth && path.cost <= bounds.time_limit + TIME_EPSILON
}

/// Up to `k` loopless paths in increasing travel time.
///
/// Paths violating the depth or time limits are dropped; the search keeps
/// deviating from them so later, shorter-hop alternatives are still found.
/// Returns the accepted paths and the number of Dijkstra node settlements.
pub(super) fn k_shortest(
    graph: &Graph,
    source: usize,
    target: usize,
    k: usize,
    bounds: &SearchBounds,
) -> (Vec<IndexPath>, usize) {
    let mut expansions = 0;
    let no_nodes = vec![false; graph.node_count()];

    let Some(first) = shortest_path(
        graph,
        source,
        target,
        &no_nodes,
        &HashSet::new(),
        &mut expansions,
    ) else {
        return (Vec::new(), expansions);
    };

    // Every path found, in order; `accepted` is the subset within bounds
    let mut found: Vec<IndexPath> = vec![first];
    let mut accepted: Vec<IndexPath> = Vec::new();
    let mut candidates: Vec<IndexPath> = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    seen.insert(found[0].edges.clone());

    loop {
        let Some(last) = found.last() else { break };

        // Paths arrive in non-decreasing cost, so nothing later fits either
        if last.cost > bounds.time_limit + TIME_EPSILON {
            break;
        }
        if within(bounds, last) {
            accepted.push(last.clone());
            if accepted.len() >= k {
                break;
            }
        }
        if expansions >= bounds.max_expansions {
            debug!(
                max_expansions = bounds.max_expansions,
                "Yen stopped at expansion budget"
            );
            break;
        }

        let last = last.clone();
        for i in 0..last.edges.len() {
            let spur = last.nodes[i];
            let root_edges = &last.edges[..i];
            let root_cost: f64 = root_edges.iter().map(|&e| graph.edge(e).travel_time).sum();

            // Ban the next edge of every found path that shares this root
            let banned_edges: HashSet<usize> = found
                .iter()
                .filter(|p| p.edges.len() > i && p.edges[..i] == *root_edges)
                .map(|p| p.edges[i])
                .collect();

            // Root nodes other than the spur may not be revisited
            let mut banned_nodes = no_nodes.clone();
            for &n in &last.nodes[..i] {
                banned_nodes[n] = true;
            }

            let Some(spur_path) = shortest_path(
                graph,
                spur,
                target,
                &banned_nodes,
                &banned_edges,
                &mut expansions,
            ) else {
                continue;
            };

            let mut nodes = last.nodes[..i].to_vec();
            nodes.extend_from_slice(&spur_path.nodes);
            let mut edges = root_edges.to_vec();
            edges.extend_from_slice(&spur_path.edges);

            if seen.insert(edges.clone()) {
                candidates.push(IndexPath {
                    nodes,
                    edges,
                    cost: root_cost + spur_path.cost,
                });
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(by_cost_then_edges);
        found.push(candidates.remove(0));
    }

    debug!(
        found = found.len(),
        accepted = accepted.len(),
        expansions,
        "Yen enumeration complete"
    );

    (accepted, expansions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Edge, Node, NodeId};

    fn bounds() -> SearchBounds {
        SearchBounds {
            max_depth: 20,
            max_paths: 10,
            time_limit: f64::INFINITY,
            allow_cycles: false,
            max_expansions: 100_000,
        }
    }

    /// The classic Yen example graph (C..H) with unit-free weights.
    fn yen_graph() -> Graph {
        let nodes = ["C", "D", "E", "F", "G", "H"]
            .iter()
            .map(|s| Node::bare(*s))
            .collect();
        let edges = vec![
            Edge::road("C", "D", 3.0, 0.0),
            Edge::road("C", "E", 2.0, 0.0),
            Edge::road("D", "F", 4.0, 0.0),
            Edge::road("E", "D", 1.0, 0.0),
            Edge::road("E", "F", 2.0, 0.0),
            Edge::road("E", "G", 3.0, 0.0),
            Edge::road("F", "G", 2.0, 0.0),
            Edge::road("F", "H", 1.0, 0.0),
            Edge::road("G", "H", 2.0, 0.0),
        ];
        Graph::new(nodes, edges).unwrap()
    }

    fn names(g: &Graph, p: &IndexPath) -> Vec<String> {
        p.nodes
            .iter()
            .map(|&n| g.node_at(n).id.as_str().to_string())
            .collect()
    }

    #[test]
    fn classic_three_shortest() {
        let g = yen_graph();
        let c = g.index_of(&NodeId::new("C")).unwrap();
        let h = g.index_of(&NodeId::new("H")).unwrap();

        let (paths, _) = k_shortest(&g, c, h, 3, &bounds());

        assert_eq!(paths.len(), 3);
        assert_eq!(names(&g, &paths[0]), vec!["C", "E", "F", "H"]);
        assert_eq!(paths[0].cost, 5.0);
        assert_eq!(paths[1].cost, 7.0);
        assert_eq!(paths[2].cost, 8.0);
    }

    #[test]
    fn costs_are_non_decreasing_and_unique() {
        let g = yen_graph();
        let c = g.index_of(&NodeId::new("C")).unwrap();
        let h = g.index_of(&NodeId::new("H")).unwrap();

        let (paths, _) = k_shortest(&g, c, h, 10, &bounds());

        assert!(paths.windows(2).all(|w| w[0].cost <= w[1].cost));
        let unique: HashSet<_> = paths.iter().map(|p| p.edges.clone()).collect();
        assert_eq!(unique.len(), paths.len());
        // Every simple path is found when K exceeds their number
        assert_eq!(paths.len(), 7);
    }

    #[test]
    fn time_limit_drops_slow_paths() {
        let g = yen_graph();
        let c = g.index_of(&NodeId::new("C")).unwrap();
        let h = g.index_of(&NodeId::new("H")).unwrap();

        let bounds = SearchBounds {
            time_limit: 7.0,
            ..bounds()
        };
        let (paths, _) = k_shortest(&g, c, h, 10, &bounds);

        assert!(paths.iter().all(|p| p.cost <= 7.0));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn unreachable_is_empty() {
        let g = yen_graph();
        let c = g.index_of(&NodeId::new("C")).unwrap();
        let h = g.index_of(&NodeId::new("H")).unwrap();

        let (paths, _) = k_shortest(&g, h, c, 3, &bounds());
        assert!(paths.is_empty());
    }
}
