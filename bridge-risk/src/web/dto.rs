//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::RoutePath;
use crate::planner::{EnumerationResult, EnumerationStrategy};
use crate::scoring::{BridgeScore, JourneyAnalysis, PathScore};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_time(t: NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Request to enumerate candidate paths.
#[derive(Debug, Deserialize)]
pub struct PathsRequest {
    /// Start node ID
    pub source: String,

    /// End node ID
    pub destination: String,
}

/// Request to analyse a journey.
#[derive(Debug, Deserialize)]
pub struct AnalyzeJourneyRequest {
    /// Start node ID
    pub source: String,

    /// End node ID
    pub destination: String,

    /// Departure time (defaults to now, local clock)
    pub departure: Option<NaiveDateTime>,

    /// Reference time for prediction horizons (defaults to departure)
    pub now: Option<NaiveDateTime>,
}

/// A candidate path.
#[derive(Debug, Serialize)]
pub struct PathResult {
    /// Node IDs from source to destination
    pub nodes: Vec<String>,

    /// Free-flow travel time in seconds
    pub travel_time_secs: f64,

    /// Number of edges
    pub hops: usize,

    /// Bridges crossed, in order
    pub bridges: Vec<String>,
}

/// Response for path enumeration.
#[derive(Debug, Serialize)]
pub struct PathsResponse {
    pub strategy: EnumerationStrategy,

    /// Fastest travel time between the endpoints, if reachable
    pub shortest_travel_time_secs: Option<f64>,

    /// Search nodes expanded
    pub nodes_expanded: usize,

    pub paths: Vec<PathResult>,
}

/// A predicted bridge crossing.
#[derive(Debug, Serialize)]
pub struct BridgeResult {
    pub bridge_id: String,

    /// Expected time the bridge is reached
    pub eta: String,

    /// Pessimistic (90th percentile) time the bridge is reached
    pub eta_p90: String,

    /// Probability the bridge is open, after clamping
    pub probability: f64,

    /// Predictor confidence
    pub confidence: f64,
}

/// A scored path.
#[derive(Debug, Serialize)]
pub struct ScoredPathResult {
    #[serde(flatten)]
    pub path: PathResult,

    /// Probability that every bridge on the path is open
    pub probability: f64,

    pub log_probability: f64,

    /// Expected arrival time
    pub arrival: String,

    /// Pessimistic (90th percentile) arrival time
    pub arrival_p90: String,

    pub bridges: Vec<BridgeResult>,
}

/// Response for journey analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeJourneyResponse {
    /// Probability that at least one path is passable
    pub any_path_ok: f64,

    pub strategy: EnumerationStrategy,

    pub departure: String,

    pub shortest_travel_time_secs: Option<f64>,

    /// Index into `paths` of the most likely passable path
    pub best_path: Option<usize>,

    pub paths: Vec<ScoredPathResult>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl PathResult {
    /// Create from a domain path.
    pub fn from_path(path: &RoutePath) -> Self {
        Self {
            nodes: path
                .nodes()
                .iter()
                .map(|n| n.as_str().to_string())
                .collect(),
            travel_time_secs: path.total_travel_time(),
            hops: path.hop_count(),
            bridges: path
                .edges()
                .iter()
                .filter_map(|e| e.crossed_bridge())
                .map(|b| b.as_str().to_string())
                .collect(),
        }
    }
}

impl PathsResponse {
    pub fn from_result(result: &EnumerationResult) -> Self {
        Self {
            strategy: result.strategy,
            shortest_travel_time_secs: result.shortest_travel_time,
            nodes_expanded: result.nodes_expanded,
            paths: result.paths.iter().map(PathResult::from_path).collect(),
        }
    }
}

impl BridgeResult {
    pub fn from_score(score: &BridgeScore) -> Self {
        Self {
            bridge_id: score.bridge_id.as_str().to_string(),
            eta: format_time(score.eta.mean_time()),
            eta_p90: format_time(score.eta.p90_time()),
            probability: score.clamped_probability,
            confidence: score.confidence,
        }
    }
}

impl ScoredPathResult {
    pub fn from_score(score: &PathScore) -> Self {
        Self {
            path: PathResult::from_path(&score.path),
            probability: score.probability,
            log_probability: score.log_probability,
            arrival: format_time(score.arrival.mean_time()),
            arrival_p90: format_time(score.arrival.p90_time()),
            bridges: score.bridges.iter().map(BridgeResult::from_score).collect(),
        }
    }
}

impl AnalyzeJourneyResponse {
    pub fn from_analysis(analysis: &JourneyAnalysis) -> Self {
        // Pointer identity recovers the index of the best path
        let best_path = analysis
            .best_path()
            .and_then(|best| analysis.paths.iter().position(|p| std::ptr::eq(p, best)));

        Self {
            any_path_ok: analysis.any_path_ok,
            strategy: analysis.strategy,
            departure: format_time(analysis.departure),
            shortest_travel_time_secs: analysis.shortest_travel_time,
            best_path,
            paths: analysis
                .paths
                .iter()
                .map(ScoredPathResult::from_score)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Edge;

    fn path() -> RoutePath {
        RoutePath::from_edges(
            vec![
                Edge::bridge("A", "B", 300.0, 1000.0, "1"),
                Edge::road("B", "C", 120.0, 400.0),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn path_result_lists_nodes_and_bridges() {
        let result = PathResult::from_path(&path());

        assert_eq!(result.nodes, vec!["A", "B", "C"]);
        assert_eq!(result.travel_time_secs, 420.0);
        assert_eq!(result.hops, 2);
        assert_eq!(result.bridges, vec!["1"]);
    }

    #[test]
    fn analyze_request_defaults_times() {
        let req: AnalyzeJourneyRequest =
            serde_json::from_str(r#"{"source": "A", "destination": "C"}"#).unwrap();
        assert!(req.departure.is_none());
        assert!(req.now.is_none());

        let req: AnalyzeJourneyRequest = serde_json::from_str(
            r#"{"source": "A", "destination": "C", "departure": "2025-01-27T08:30:00"}"#,
        )
        .unwrap();
        assert_eq!(
            req.departure.map(format_time).as_deref(),
            Some("2025-01-27T08:30:00")
        );
    }

    #[test]
    fn scored_path_flattens_path_fields() {
        let json = serde_json::to_value(ScoredPathResult {
            path: PathResult::from_path(&path()),
            probability: 0.9,
            log_probability: 0.9f64.ln(),
            arrival: "2025-01-27T08:07:00".into(),
            arrival_p90: "2025-01-27T08:08:00".into(),
            bridges: Vec::new(),
        })
        .unwrap();

        assert_eq!(json["nodes"][2], "C");
        assert_eq!(json["travel_time_secs"], 420.0);
        assert_eq!(json["probability"], 0.9);
    }
}
