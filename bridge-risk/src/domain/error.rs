//! Domain error types.
//!
//! These errors represent malformed graphs and paths. They are raised by the
//! validators on `Graph` and `RoutePath`, which are the only gate on
//! malformed input: nothing in the domain layer repairs data silently.

use super::NodeId;

/// A graph failed validation.
///
/// Every variant names the offending edge (by its index in the edge list)
/// or node so the caller can fix the input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphIntegrityError {
    /// An edge references a node that is not in the node set
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: usize, node: NodeId },

    /// Travel time is negative
    #[error("edge {edge} has negative travel time {seconds}s")]
    NegativeTravelTime { edge: usize, seconds: f64 },

    /// Travel time or distance is NaN or infinite
    #[error("edge {edge} has non-finite {field}")]
    NonFinite { edge: usize, field: &'static str },

    /// Edge is flagged as a bridge but carries no bridge identifier
    #[error("bridge edge {edge} has no bridge identifier")]
    MissingBridgeId { edge: usize },

    /// The same node identifier appears twice
    #[error("duplicate node {0}")]
    DuplicateNode(NodeId),
}

/// A route path failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathContiguityError {
    /// A path needs at least one node
    #[error("path has no nodes")]
    Empty,

    /// Node and edge counts disagree (`nodes == edges + 1` is required)
    #[error("path has {nodes} nodes but {edges} edges")]
    LengthMismatch { nodes: usize, edges: usize },

    /// Edge `index` does not connect `nodes[index]` to `nodes[index + 1]`
    #[error("edge {index} does not chain: expected {expected}, found {found}")]
    Broken {
        index: usize,
        expected: NodeId,
        found: NodeId,
    },

    /// A node is visited twice and cycles are not allowed
    #[error("node {0} repeats in path")]
    RepeatedNode(NodeId),
}
