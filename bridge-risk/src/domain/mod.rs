//! Domain types for the bridge-crossing risk engine.
//!
//! This module contains the core domain model: nodes, directed edges, the
//! graph built from them, and route paths through it. Graphs and paths
//! enforce their invariants at construction time, so code that receives
//! these types can trust their validity.

mod edge;
mod error;
mod graph;
mod node;
mod path;
pub mod time;

pub use edge::{BridgeId, Edge, SegmentType};
pub use error::{GraphIntegrityError, PathContiguityError};
pub use graph::{Graph, GraphDocument, GraphLoadError};
pub use node::{Node, NodeId};
pub use path::{BridgeCrossing, RoutePath};
pub use time::TimeBucket;
