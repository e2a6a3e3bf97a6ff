//! Enumeration configuration for the path planner.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, check_non_negative, check_nonzero, check_positive};

/// Which enumeration algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationMode {
    /// Depth-first simple-path search with pruning.
    Dfs,
    /// Yen's K-shortest simple paths.
    KShortest,
    /// Pick between the two from graph size and requested K.
    Auto,
}

/// Limits for path enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnumerationConfig {
    /// Algorithm selection.
    pub mode: EnumerationMode,

    /// Maximum number of edges in a path.
    pub max_depth: usize,

    /// Maximum number of paths to return.
    pub max_paths: usize,

    /// Paths slower than this (seconds) are pruned.
    pub max_travel_time_secs: f64,

    /// Paths slower than the shortest path by more than this (seconds) are pruned.
    pub max_time_over_shortest_secs: f64,

    /// K for Yen's algorithm.
    pub k_shortest_paths: usize,

    /// Allow DFS paths to revisit nodes (still bounded by `max_depth`).
    /// Yen's algorithm always produces simple paths.
    pub allow_cycles: bool,

    /// Auto mode uses Yen when the graph has more nodes than this...
    pub auto_node_threshold: usize,

    /// ...and K exceeds this.
    pub auto_k_threshold: usize,

    /// Upper bound on search-node expansions per request.
    pub max_expansions: usize,
}

impl EnumerationConfig {
    /// Check that every cap is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_nonzero("enumeration.max_depth", self.max_depth)?;
        check_nonzero("enumeration.max_paths", self.max_paths)?;
        check_positive(
            "enumeration.max_travel_time_secs",
            self.max_travel_time_secs,
        )?;
        check_non_negative(
            "enumeration.max_time_over_shortest_secs",
            self.max_time_over_shortest_secs,
        )?;
        check_nonzero("enumeration.k_shortest_paths", self.k_shortest_paths)?;
        check_nonzero("enumeration.max_expansions", self.max_expansions)?;
        Ok(())
    }
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            mode: EnumerationMode::Auto,
            max_depth: 20,
            max_paths: 10,
            max_travel_time_secs: 3600.0,       // 1 hour
            max_time_over_shortest_secs: 900.0, // 15 minutes
            k_shortest_paths: 5,
            allow_cycles: false,
            auto_node_threshold: 200,
            auto_k_threshold: 2,
            max_expansions: 200_000,
        }
    }
}
