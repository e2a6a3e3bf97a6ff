//! Path enumeration service.
//!
//! Chooses between depth-first and K-shortest enumeration and applies the
//! shared depth, time and expansion bounds.

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{Graph, NodeId, PathContiguityError, RoutePath};

use super::config::{EnumerationConfig, EnumerationMode};
use super::dijkstra::{distances_to, hops_to};
use super::{dfs, yen};

/// Error from path enumeration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    /// Source or destination is not in the graph
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// An enumerated path failed validation
    #[error("enumerated an invalid path: {0}")]
    InvalidPath(#[from] PathContiguityError),
}

/// Algorithm actually used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationStrategy {
    Dfs,
    KShortest,
}

/// Bounds shared by both algorithms, resolved once per request.
#[derive(Debug, Clone)]
pub(crate) struct SearchBounds {
    pub max_depth: usize,
    pub max_paths: usize,
    /// `min(max_travel_time, shortest + max_time_over_shortest)`
    pub time_limit: f64,
    pub allow_cycles: bool,
    pub max_expansions: usize,
}

/// Result of path enumeration.
#[derive(Debug, Clone, Serialize)]
pub struct EnumerationResult {
    /// Paths found. K-shortest results are in increasing travel time.
    pub paths: Vec<RoutePath>,

    /// Which algorithm ran.
    pub strategy: EnumerationStrategy,

    /// Search nodes expanded.
    pub nodes_expanded: usize,

    /// Fastest possible travel time, if the destination is reachable.
    pub shortest_travel_time: Option<f64>,
}

impl EnumerationResult {
    /// Create an empty result.
    pub fn empty(strategy: EnumerationStrategy) -> Self {
        Self {
            paths: Vec::new(),
            strategy,
            nodes_expanded: 0,
            shortest_travel_time: None,
        }
    }
}

/// Enumerates candidate routes between two nodes.
///
/// # Examples
///
/// ```
/// use bridge_risk::domain::{Edge, Graph, Node, NodeId};
/// use bridge_risk::planner::{EnumerationConfig, PathEnumerator};
///
/// let graph = Graph::new(
///     vec![Node::bare("A"), Node::bare("B"), Node::bare("C")],
///     vec![
///         Edge::bridge("A", "B", 60.0, 100.0, "1"),
///         Edge::road("B", "C", 30.0, 50.0),
///     ],
/// )
/// .unwrap();
///
/// let config = EnumerationConfig::default();
/// let result = PathEnumerator::new(&config)
///     .enumerate(&graph, &NodeId::new("A"), &NodeId::new("C"))
///     .unwrap();
/// assert_eq!(result.paths.len(), 1);
/// assert_eq!(result.paths[0].bridge_count(), 1);
/// ```
pub struct PathEnumerator<'a> {
    config: &'a EnumerationConfig,
}

impl<'a> PathEnumerator<'a> {
    pub fn new(config: &'a EnumerationConfig) -> Self {
        Self { config }
    }

    /// Strategy the configured mode resolves to for this graph.
    pub fn strategy_for(&self, graph: &Graph) -> EnumerationStrategy {
        match self.config.mode {
            EnumerationMode::Dfs => EnumerationStrategy::Dfs,
            EnumerationMode::KShortest => EnumerationStrategy::KShortest,
            EnumerationMode::Auto => {
                if graph.node_count() > self.config.auto_node_threshold
                    && self.config.k_shortest_paths > self.config.auto_k_threshold
                {
                    EnumerationStrategy::KShortest
                } else {
                    EnumerationStrategy::Dfs
                }
            }
        }
    }

    /// Enumerate paths from `source` to `destination`.
    ///
    /// Returns an empty result when the endpoints coincide, are
    /// disconnected, or every candidate is pruned.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::UnknownNode` if either endpoint is not in the graph.
    pub fn enumerate(
        &self,
        graph: &Graph,
        source: &NodeId,
        destination: &NodeId,
    ) -> Result<EnumerationResult, PlannerError> {
        let src = graph
            .index_of(source)
            .ok_or_else(|| PlannerError::UnknownNode(source.clone()))?;
        let dst = graph
            .index_of(destination)
            .ok_or_else(|| PlannerError::UnknownNode(destination.clone()))?;

        let strategy = self.strategy_for(graph);

        if src == dst {
            debug!(%source, "Source equals destination, nothing to enumerate");
            return Ok(EnumerationResult::empty(strategy));
        }

        let dist_to_target = distances_to(graph, dst);
        let shortest = dist_to_target[src];
        if !shortest.is_finite() {
            debug!(%source, %destination, "Destination unreachable");
            return Ok(EnumerationResult::empty(strategy));
        }

        let bounds = SearchBounds {
            max_depth: self.config.max_depth,
            max_paths: self.config.max_paths,
            time_limit: self
                .config
                .max_travel_time_secs
                .min(shortest + self.config.max_time_over_shortest_secs),
            allow_cycles: self.config.allow_cycles,
            max_expansions: self.config.max_expansions,
        };

        let (found, nodes_expanded) = match strategy {
            EnumerationStrategy::Dfs => {
                let hops_to_target = hops_to(graph, dst);
                dfs::enumerate(graph, src, dst, &bounds, &dist_to_target, &hops_to_target)
            }
            EnumerationStrategy::KShortest => {
                let k = self.config.k_shortest_paths.min(self.config.max_paths);
                yen::k_shortest(graph, src, dst, k, &bounds)
            }
        };

        // Yen paths are always simple, whatever the cycle setting
        let allow_cycles = strategy == EnumerationStrategy::Dfs && self.config.allow_cycles;
        let paths = found
            .iter()
            .map(|p| p.to_route_path(graph, allow_cycles))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            %source,
            %destination,
            ?strategy,
            paths = paths.len(),
            nodes_expanded,
            shortest_travel_time = shortest,
            "Enumeration complete"
        );

        Ok(EnumerationResult {
            paths,
            strategy,
            nodes_expanded,
            shortest_travel_time: Some(shortest),
        })
    }
}
