//! Route paths through the graph.
//!
//! A `RoutePath` is an ordered node sequence plus the edges connecting them.
//! Totals are derived from the edges on demand, so they cannot disagree with
//! the edge list.

use std::collections::HashSet;

use serde::Serialize;

use super::{BridgeId, Edge, NodeId, PathContiguityError};

/// A bridge crossed along a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeCrossing {
    /// Position of the bridge edge within the path
    pub edge_position: usize,
    /// The bridge crossed
    pub bridge_id: BridgeId,
}

/// A route from origin to destination.
///
/// # Invariants
///
/// - At least one node; `nodes.len() == edges.len() + 1`
/// - `edges[i]` goes from `nodes[i]` to `nodes[i + 1]`, so consecutive
///   edges chain (`edges[i].to == edges[i + 1].from`)
/// - No node repeats, unless the path was built with cycles allowed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
}

impl RoutePath {
    /// Construct a path, validating contiguity.
    ///
    /// # Errors
    ///
    /// Returns `PathContiguityError` if the node and edge lists disagree or,
    /// when `allow_cycles` is false, a node repeats.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_risk::domain::{Edge, NodeId, RoutePath};
    ///
    /// let path = RoutePath::new(
    ///     vec![NodeId::new("A"), NodeId::new("B"), NodeId::new("C")],
    ///     vec![
    ///         Edge::bridge("A", "B", 300.0, 400.0, "1"),
    ///         Edge::road("B", "C", 120.0, 900.0),
    ///     ],
    ///     false,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(path.total_travel_time(), 420.0);
    /// assert_eq!(path.bridge_count(), 1);
    /// ```
    pub fn new(
        nodes: Vec<NodeId>,
        edges: Vec<Edge>,
        allow_cycles: bool,
    ) -> Result<Self, PathContiguityError> {
        let path = Self { nodes, edges };
        path.validate(allow_cycles)?;
        Ok(path)
    }

    /// Build a path from edges alone, deriving the node sequence.
    pub fn from_edges(edges: Vec<Edge>, allow_cycles: bool) -> Result<Self, PathContiguityError> {
        let first = edges.first().ok_or(PathContiguityError::Empty)?;
        let mut nodes = Vec::with_capacity(edges.len() + 1);
        nodes.push(first.from.clone());
        for (i, edge) in edges.iter().enumerate() {
            if i > 0 && edges[i - 1].to != edge.from {
                return Err(PathContiguityError::Broken {
                    index: i,
                    expected: edges[i - 1].to.clone(),
                    found: edge.from.clone(),
                });
            }
            nodes.push(edge.to.clone());
        }
        Self::new(nodes, edges, allow_cycles)
    }

    /// Check the path invariants.
    pub fn validate(&self, allow_cycles: bool) -> Result<(), PathContiguityError> {
        if self.nodes.is_empty() {
            return Err(PathContiguityError::Empty);
        }
        if self.nodes.len() != self.edges.len() + 1 {
            return Err(PathContiguityError::LengthMismatch {
                nodes: self.nodes.len(),
                edges: self.edges.len(),
            });
        }

        for (i, edge) in self.edges.iter().enumerate() {
            if edge.from != self.nodes[i] {
                return Err(PathContiguityError::Broken {
                    index: i,
                    expected: self.nodes[i].clone(),
                    found: edge.from.clone(),
                });
            }
            if edge.to != self.nodes[i + 1] {
                return Err(PathContiguityError::Broken {
                    index: i,
                    expected: self.nodes[i + 1].clone(),
                    found: edge.to.clone(),
                });
            }
        }

        if !allow_cycles {
            let mut seen = HashSet::with_capacity(self.nodes.len());
            for node in &self.nodes {
                if !seen.insert(node) {
                    return Err(PathContiguityError::RepeatedNode(node.clone()));
                }
            }
        }

        Ok(())
    }

    /// Returns the node sequence.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the edges in travel order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the first node.
    pub fn origin(&self) -> &NodeId {
        // Safe: validated non-empty at construction
        &self.nodes[0]
    }

    /// Returns the last node.
    pub fn destination(&self) -> &NodeId {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Number of edges (hops).
    pub fn hop_count(&self) -> usize {
        self.edges.len()
    }

    /// Sum of free-flow travel times, in seconds.
    pub fn total_travel_time(&self) -> f64 {
        self.edges.iter().map(|e| e.travel_time).sum()
    }

    /// Sum of edge lengths, in metres.
    pub fn total_distance(&self) -> f64 {
        self.edges.iter().map(|e| e.distance).sum()
    }

    /// Number of bridge edges.
    pub fn bridge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.crossed_bridge().is_some())
            .count()
    }

    /// Bridges crossed, in travel order.
    pub fn bridge_crossings(&self) -> Vec<BridgeCrossing> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                e.crossed_bridge().map(|b| BridgeCrossing {
                    edge_position: i,
                    bridge_id: b.clone(),
                })
            })
            .collect()
    }

    /// Returns true if the path crosses the given bridge.
    pub fn crosses(&self, bridge: &BridgeId) -> bool {
        self.edges
            .iter()
            .any(|e| e.crossed_bridge() == Some(bridge))
    }
}
