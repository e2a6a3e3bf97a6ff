//! Path enumeration over the road-and-bridge graph.
//!
//! Answers "which reasonable routes lead from here to there?". Two
//! algorithms are available: an iterative-deepening depth-first search that
//! lists every route within the depth and time limits, and Yen's K-shortest
//! simple paths for larger graphs. Both prune with the true shortest travel
//! time to the destination, computed once per request by reverse Dijkstra.

mod config;
mod dfs;
mod dijkstra;
mod search;
mod yen;


pub use config::{EnumerationConfig, EnumerationMode};
pub use search::{EnumerationResult, EnumerationStrategy, PathEnumerator, PlannerError};
