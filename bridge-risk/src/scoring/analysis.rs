//! Scored results.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{BridgeId, RoutePath};
use crate::eta::EtaSummary;
use crate::planner::EnumerationStrategy;

/// Prediction for one bridge crossing on a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeScore {
    pub bridge_id: BridgeId,
    /// Index of the bridge edge within the path.
    pub edge_position: usize,
    pub eta: EtaSummary,
    /// Predictor output, after replacing non-finite values.
    pub raw_probability: f64,
    /// Probability used in aggregation.
    pub clamped_probability: f64,
    pub confidence: f64,
}

/// A path with its probability of passing every bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathScore {
    pub path: RoutePath,
    pub log_probability: f64,
    /// `exp(log_probability)`
    pub probability: f64,
    pub arrival: EtaSummary,
    pub bridges: Vec<BridgeScore>,
}

impl PathScore {
    pub fn travel_time(&self) -> f64 {
        self.path.total_travel_time()
    }
}

/// Result of analysing one journey request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyAnalysis {
    /// Scored candidate paths, in enumeration order.
    pub paths: Vec<PathScore>,
    /// Probability that at least one candidate path is passable.
    pub any_path_ok: f64,
    pub strategy: EnumerationStrategy,
    pub departure: NaiveDateTime,
    pub shortest_travel_time: Option<f64>,
}

impl JourneyAnalysis {
    /// Most likely passable path, ties broken by travel time.
    pub fn best_path(&self) -> Option<&PathScore> {
        self.paths.iter().max_by(|a, b| {
            a.probability
                .total_cmp(&b.probability)
                .then_with(|| b.travel_time().total_cmp(&a.travel_time()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
