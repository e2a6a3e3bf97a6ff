//! Node identifiers and nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a node in the road graph.
///
/// Identifiers are compared and hashed as plain strings; the graph assigns
/// no meaning to their contents.
///
/// # Examples
///
/// ```
/// use bridge_risk::domain::NodeId;
///
/// let a = NodeId::new("A");
/// assert_eq!(a.as_str(), "A");
/// assert_eq!(a, NodeId::from("A"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in the road network: an intersection, bridge approach or endpoint.
///
/// Nodes are immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier
    pub id: NodeId,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// WGS84 latitude in degrees
    #[serde(default)]
    pub latitude: f64,
    /// WGS84 longitude in degrees
    #[serde(default)]
    pub longitude: f64,
}

impl Node {
    /// Creates a node.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: NodeId::new(id),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Creates a node with no name or coordinates, for tests and synthetic graphs.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: NodeId(id),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug() {
        let id = NodeId::new("Fremont-N");
        assert_eq!(format!("{}", id), "Fremont-N");
        assert_eq!(format!("{:?}", id), "NodeId(Fremont-N)");
    }

    #[test]
    fn serde_is_transparent() {
        let id = NodeId::new("A");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"A\"");
        let back: NodeId = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn node_defaults_optional_fields() {
        let node: Node = serde_json::from_str(r#"{"id": "X"}"#).unwrap();
        assert_eq!(node.id, NodeId::new("X"));
        assert!(node.name.is_empty());
        assert_eq!(node.latitude, 0.0);
    }
}
