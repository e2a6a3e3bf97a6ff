//! Road-and-bridge graph.
//!
//! The graph owns the node set and the edge list. Adjacency (node to outgoing
//! and incoming edges) is derived once at construction from the edge list and
//! never maintained separately, so it cannot drift from the edges.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{BridgeId, Edge, GraphIntegrityError, Node, NodeId};

/// Serialized form of a graph: plain node and edge lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Error loading a graph document from disk.
#[derive(Debug, thiserror::Error)]
pub enum GraphLoadError {
    #[error("failed to read graph file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Integrity(#[from] GraphIntegrityError),
}

/// A validated, immutable directed graph.
///
/// Nodes and edges are addressed internally by their position in the
/// original lists. Adjacency lists preserve edge-list order, which gives
/// every search over the graph a deterministic tie-break.
///
/// # Invariants
///
/// - Node identifiers are unique
/// - Every edge's endpoints exist in the node set
/// - Travel times are finite and non-negative
/// - Bridge edges carry a bridge identifier
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    endpoints: Vec<(usize, usize)>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl Graph {
    /// Build a graph, validating it first.
    ///
    /// # Errors
    ///
    /// Returns `GraphIntegrityError` describing the first offending node or
    /// edge. No partial graph is produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_risk::domain::{Edge, Graph, Node};
    ///
    /// let graph = Graph::new(
    ///     vec![Node::bare("A"), Node::bare("B")],
    ///     vec![Edge::bridge("A", "B", 300.0, 200.0, "1")],
    /// )
    /// .unwrap();
    /// assert_eq!(graph.edge_count(), 1);
    ///
    /// // Edges to unknown nodes are rejected
    /// assert!(Graph::new(vec![Node::bare("A")], vec![Edge::road("A", "Z", 10.0, 0.0)]).is_err());
    /// ```
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphIntegrityError> {
        let index = build_index(&nodes)?;
        let endpoints = check_edges(&index, &edges)?;

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (edge_idx, &(from, to)) in endpoints.iter().enumerate() {
            outgoing[from].push(edge_idx);
            incoming[to].push(edge_idx);
        }

        Ok(Self {
            nodes,
            index,
            edges,
            endpoints,
            outgoing,
            incoming,
        })
    }

    /// Build a graph from its serialized document.
    pub fn from_document(doc: GraphDocument) -> Result<Self, GraphIntegrityError> {
        Self::new(doc.nodes, doc.edges)
    }

    /// Parse and validate a graph from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, GraphLoadError> {
        let doc: GraphDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc)?)
    }

    /// Load and validate a graph from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphLoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Re-run the integrity checks.
    ///
    /// Construction already validates, so this only fails if the checks
    /// themselves change; it is kept as the explicit contract for callers
    /// that receive a graph from elsewhere.
    pub fn validate(&self) -> Result<(), GraphIntegrityError> {
        let index = build_index(&self.nodes)?;
        check_edges(&index, &self.edges).map(|_| ())
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns true if the node exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Returns the internal index of a node.
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the node at an internal index.
    pub fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Returns the edge at an index in the edge list.
    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    /// Returns `(from, to)` node indices of an edge.
    pub fn endpoints(&self, edge_idx: usize) -> (usize, usize) {
        self.endpoints[edge_idx]
    }

    /// Indices of edges leaving a node, in edge-list order.
    pub fn outgoing(&self, node_idx: usize) -> &[usize] {
        &self.outgoing[node_idx]
    }

    /// Indices of edges entering a node, in edge-list order.
    pub fn incoming(&self, node_idx: usize) -> &[usize] {
        &self.incoming[node_idx]
    }

    /// Edges leaving the given node. Empty if the node is unknown.
    pub fn outgoing_edges(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        let slice: &[usize] = match self.index.get(id) {
            Some(&i) => &self.outgoing[i],
            None => &[],
        };
        slice.iter().map(move |&e| &self.edges[e])
    }

    /// Distinct bridge identifiers in canonical order.
    ///
    /// Numeric identifiers sort numerically and come first; the rest sort
    /// lexically. This order defines the bridge index in feature vectors.
    pub fn bridge_ids(&self) -> Vec<BridgeId> {
        let mut ids: Vec<BridgeId> = self
            .edges
            .iter()
            .filter_map(|e| e.crossed_bridge().cloned())
            .collect();
        ids.sort_by(|a, b| match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        });
        ids.dedup();
        ids
    }
}

fn build_index(nodes: &[Node]) -> Result<HashMap<NodeId, usize>, GraphIntegrityError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id.clone(), i).is_some() {
            return Err(GraphIntegrityError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(index)
}

fn check_edges(
    index: &HashMap<NodeId, usize>,
    edges: &[Edge],
) -> Result<Vec<(usize, usize)>, GraphIntegrityError> {
    let mut endpoints = Vec::with_capacity(edges.len());

    for (i, edge) in edges.iter().enumerate() {
        let from = *index
            .get(&edge.from)
            .ok_or_else(|| GraphIntegrityError::UnknownNode {
                edge: i,
                node: edge.from.clone(),
            })?;
        let to = *index
            .get(&edge.to)
            .ok_or_else(|| GraphIntegrityError::UnknownNode {
                edge: i,
                node: edge.to.clone(),
            })?;

        if !edge.travel_time.is_finite() {
            return Err(GraphIntegrityError::NonFinite {
                edge: i,
                field: "travel_time",
            });
        }
        if edge.travel_time < 0.0 {
            return Err(GraphIntegrityError::NegativeTravelTime {
                edge: i,
                seconds: edge.travel_time,
            });
        }
        if !edge.distance.is_finite() {
            return Err(GraphIntegrityError::NonFinite {
                edge: i,
                field: "distance",
            });
        }
        if edge.is_bridge && edge.bridge_id.is_none() {
            return Err(GraphIntegrityError::MissingBridgeId { edge: i });
        }

        endpoints.push((from, to));
    }

    Ok(endpoints)
}
