//! Directed edges and bridge identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Identifier of a movable bridge.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeId(String);

impl BridgeId {
    /// Create a bridge identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier as an integer, if it is purely numeric.
    pub fn as_number(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl From<&str> for BridgeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BridgeId({})", self.0)
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of road segment, used to pick a traffic multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Road,
    Bridge,
}

/// A directed road segment.
///
/// Two-way roads are two edges; the graph never infers the reverse direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Origin node
    pub from: NodeId,
    /// Destination node
    pub to: NodeId,
    /// Free-flow travel time in seconds
    pub travel_time: f64,
    /// Length in metres
    #[serde(default)]
    pub distance: f64,
    /// Whether this segment crosses a movable bridge
    #[serde(default)]
    pub is_bridge: bool,
    /// Which bridge, required when `is_bridge` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<BridgeId>,
}

impl Edge {
    /// Creates an ordinary road edge.
    pub fn road(
        from: impl Into<String>,
        to: impl Into<String>,
        travel_time: f64,
        distance: f64,
    ) -> Self {
        Self {
            from: NodeId::new(from),
            to: NodeId::new(to),
            travel_time,
            distance,
            is_bridge: false,
            bridge_id: None,
        }
    }

    /// Creates a bridge edge.
    pub fn bridge(
        from: impl Into<String>,
        to: impl Into<String>,
        travel_time: f64,
        distance: f64,
        bridge_id: impl Into<String>,
    ) -> Self {
        Self {
            from: NodeId::new(from),
            to: NodeId::new(to),
            travel_time,
            distance,
            is_bridge: true,
            bridge_id: Some(BridgeId::new(bridge_id)),
        }
    }

    /// Returns the segment type for traffic lookups.
    pub fn segment_type(&self) -> SegmentType {
        if self.is_bridge {
            SegmentType::Bridge
        } else {
            SegmentType::Road
        }
    }

    /// Returns the bridge identifier if this edge is a bridge crossing.
    pub fn crossed_bridge(&self) -> Option<&BridgeId> {
        if self.is_bridge {
            self.bridge_id.as_ref()
        } else {
            None
        }
    }
}
