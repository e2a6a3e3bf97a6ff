//! Tests for journey analysis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use super::*;
use crate::config::{Config, ConfigError};
use crate::domain::{Edge, Graph, Node, NodeId};
use crate::metrics::PipelineMetrics;
use crate::planner::{EnumerationMode, PlannerError};
use crate::predict::{
    BridgeOpeningPredictor, BridgePrediction, PredictionError, PredictionMode, PredictionRequest,
};

fn departure() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 27)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

/// A->B (bridge 1, 300s), B->C (120s), A->D (400s), D->C (bridge 2, 100s)
fn scenario_graph() -> Graph {
    Graph::new(
        ["A", "B", "C", "D"]
            .iter()
            .map(|s| Node::bare(*s))
            .collect(),
        vec![
            Edge::bridge("A", "B", 300.0, 1000.0, "1"),
            Edge::road("B", "C", 120.0, 400.0),
            Edge::road("A", "D", 400.0, 1500.0),
            Edge::bridge("D", "C", 100.0, 300.0, "2"),
        ],
    )
    .unwrap()
}

/// Returns a fixed probability per bridge id.
struct Fixed(HashMap<&'static str, f64>);

impl Fixed {
    fn new(pairs: &[(&'static str, f64)]) -> Arc<Self> {
        Arc::new(Self(pairs.iter().copied().collect()))
    }
}

impl BridgeOpeningPredictor for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError> {
        Ok(batch
            .iter()
            .map(|r| BridgePrediction {
                bridge_id: r.bridge_id.clone(),
                probability: self.0.get(r.bridge_id.as_str()).copied().unwrap_or(0.5),
                confidence: 1.0,
            })
            .collect())
    }
}

/// Drops the last prediction.
struct Truncating;

impl BridgeOpeningPredictor for Truncating {
    fn name(&self) -> &'static str {
        "truncating"
    }

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError> {
        let mut out = Fixed(HashMap::new()).predict_batch(batch)?;
        out.pop();
        Ok(out)
    }
}

/// Blocks longer than any test timeout.
struct Slow;

impl BridgeOpeningPredictor for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError> {
        std::thread::sleep(Duration::from_millis(300));
        Fixed(HashMap::new()).predict_batch(batch)
    }
}

fn dfs_config() -> Config {
    let mut config = Config::testing();
    config.enumeration.mode = EnumerationMode::Dfs;
    config.enumeration.max_paths = 10;
    config
}

fn analyzer_with(
    config: Config,
    graph: &Graph,
    predictor: Arc<dyn BridgeOpeningPredictor>,
) -> JourneyAnalyzer {
    JourneyAnalyzer::with_predictor(
        config,
        graph,
        AnalyzerSources::default(),
        predictor,
        Arc::new(PipelineMetrics::new()),
    )
    .unwrap()
}

fn request(from: &str, to: &str) -> JourneyRequest {
    JourneyRequest::new(id(from), id(to), departure())
}

#[tokio::test]
async fn scenario_two_paths_union() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[("1", 0.9), ("2", 0.8)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();

    assert_eq!(analysis.paths.len(), 2);
    let names: Vec<Vec<&str>> = analysis
        .paths
        .iter()
        .map(|p| p.path.nodes().iter().map(|n| n.as_str()).collect())
        .collect();
    assert_eq!(names, vec![vec!["A", "B", "C"], vec!["A", "D", "C"]]);

    assert!((analysis.paths[0].probability - 0.9).abs() < 1e-12);
    assert!((analysis.paths[1].probability - 0.8).abs() < 1e-12);
    assert!((analysis.any_path_ok - 0.98).abs() < 1e-12);
    assert_eq!(analysis.shortest_travel_time, Some(420.0));
}

#[tokio::test]
async fn bridge_breakdown_records_eta_and_clamp() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[("1", 1.0), ("2", 0.0)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();

    let first = &analysis.paths[0].bridges[0];
    assert_eq!(first.bridge_id.as_str(), "1");
    assert_eq!(first.edge_position, 0);
    assert_eq!(first.eta.mean_secs, 0.0);
    assert_eq!(first.raw_probability, 1.0);
    assert_eq!(first.clamped_probability, 0.99);

    let second = &analysis.paths[1].bridges[0];
    assert_eq!(second.edge_position, 1);
    assert_eq!(second.eta.mean_secs, 400.0);
    assert_eq!(second.clamped_probability, 0.05);
    assert!((analysis.paths[1].log_probability - 0.05f64.ln()).abs() < 1e-12);
}

#[tokio::test]
async fn single_path_equals_union() {
    let graph = Graph::new(
        vec![Node::bare("A"), Node::bare("B"), Node::bare("C")],
        vec![
            Edge::bridge("A", "B", 60.0, 0.0, "1"),
            Edge::bridge("B", "C", 60.0, 0.0, "2"),
        ],
    )
    .unwrap();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[("1", 0.7), ("2", 0.6)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();

    assert_eq!(analysis.paths.len(), 1);
    assert!((analysis.paths[0].probability - 0.42).abs() < 1e-12);
    assert!((analysis.any_path_ok - analysis.paths[0].probability).abs() < 1e-12);
}

#[tokio::test]
async fn all_zero_probabilities_give_zero() {
    let graph = scenario_graph();
    let mut config = dfs_config();
    config.scoring.min_probability = 0.0;
    config.scoring.max_probability = 1.0;
    let analyzer = analyzer_with(config, &graph, Fixed::new(&[("1", 0.0), ("2", 0.0)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();

    assert_eq!(analysis.paths.len(), 2);
    assert!(analysis.paths.iter().all(|p| p.probability == 0.0));
    assert_eq!(analysis.any_path_ok, 0.0);
}

#[tokio::test]
async fn path_without_bridges_is_certain() {
    let graph = Graph::new(
        vec![Node::bare("A"), Node::bare("B")],
        vec![Edge::road("A", "B", 60.0, 0.0)],
    )
    .unwrap();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[]));

    let analysis = analyzer.analyze(&graph, &request("A", "B")).await.unwrap();

    assert_eq!(analysis.paths[0].probability, 1.0);
    assert_eq!(analysis.any_path_ok, 1.0);
    assert_eq!(analyzer.metrics().snapshot().crossings_predicted, 0);
}

#[tokio::test]
async fn unreachable_destination_is_empty() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[]));

    let analysis = analyzer.analyze(&graph, &request("C", "A")).await.unwrap();

    assert!(analysis.is_empty());
    assert_eq!(analysis.any_path_ok, 0.0);
    assert!(analysis.best_path().is_none());
    assert_eq!(analyzer.metrics().snapshot().empty_results, 1);
}

#[tokio::test]
async fn unknown_node_is_error() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[]));

    let err = analyzer
        .analyze(&graph, &request("A", "Z"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Planner(PlannerError::UnknownNode(ref n)) if n.as_str() == "Z"
    ));
    assert_eq!(analyzer.metrics().snapshot().failed_requests, 1);
}

async fn analyze_with_built_predictor(config: Config, graph: &Graph) -> JourneyAnalysis {
    let analyzer = JourneyAnalyzer::new(
        config,
        graph,
        AnalyzerSources::default(),
        Arc::new(PipelineMetrics::new()),
    )
    .unwrap();
    analyzer.analyze(graph, &request("A", "C")).await.unwrap()
}

#[tokio::test]
async fn mock_predictions_are_reproducible() {
    let graph = scenario_graph();
    let mut config = dfs_config();
    config.prediction.mode = PredictionMode::Mock { seed: 1234 };

    let a = analyze_with_built_predictor(config.clone(), &graph).await;
    let b = analyze_with_built_predictor(config, &graph).await;
    assert_eq!(a.any_path_ok.to_bits(), b.any_path_ok.to_bits());
    assert_eq!(a, b);
}

#[tokio::test]
async fn best_path_prefers_probability() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[("1", 0.3), ("2", 0.8)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();
    let best = analysis.best_path().unwrap();
    assert_eq!(best.path.nodes()[1].as_str(), "D");
}

#[tokio::test]
async fn shared_bucket_hits_cache() {
    // Both routes reach bridge 1 at departure
    let graph = Graph::new(
        ["A", "B", "C", "D"]
            .iter()
            .map(|s| Node::bare(*s))
            .collect(),
        vec![
            Edge::bridge("A", "B", 60.0, 0.0, "1"),
            Edge::road("B", "C", 60.0, 0.0),
            Edge::road("B", "D", 30.0, 0.0),
            Edge::road("D", "C", 60.0, 0.0),
        ],
    )
    .unwrap();
    let analyzer = analyzer_with(dfs_config(), &graph, Fixed::new(&[("1", 0.9)]));

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();
    assert_eq!(analysis.paths.len(), 2);

    let snapshot = analyzer.metrics().snapshot();
    assert_eq!(snapshot.crossings_predicted, 2);
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.cache_hits, 1);

    // Union of two paths through the same bridge, treated as independent
    assert!((analysis.any_path_ok - (1.0 - 0.1 * 0.1)).abs() < 1e-12);
}

#[tokio::test]
async fn non_finite_prediction_uses_default() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(
        dfs_config(),
        &graph,
        Fixed::new(&[("1", f64::NAN), ("2", f64::INFINITY)]),
    );

    let analysis = analyzer.analyze(&graph, &request("A", "C")).await.unwrap();

    let default = analyzer.config().prediction.default_probability;
    for path in &analysis.paths {
        assert_eq!(path.bridges[0].raw_probability, default);
        assert!(path.probability.is_finite());
    }
    assert_eq!(analyzer.metrics().snapshot().non_finite_predictions, 2);
}

#[tokio::test]
async fn batch_length_mismatch_is_error() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Arc::new(Truncating));

    let err = analyzer
        .analyze(&graph, &request("A", "C"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Prediction(PredictionError::BatchLengthMismatch {
            expected: 2,
            actual: 1
        })
    ));
}

#[tokio::test]
async fn timeout_abandons_request() {
    let graph = scenario_graph();
    let analyzer = analyzer_with(dfs_config(), &graph, Arc::new(Slow));

    let err = analyzer
        .analyze_with_timeout(&graph, &request("A", "C"), Duration::from_millis(20))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Timeout(_)));
    assert_eq!(analyzer.metrics().snapshot().timeouts, 1);
}

#[tokio::test]
async fn horizon_measured_from_now() {
    let graph = scenario_graph();

    struct Horizons;
    impl BridgeOpeningPredictor for Horizons {
        fn name(&self) -> &'static str {
            "horizons"
        }
        fn predict_batch(
            &self,
            batch: &[PredictionRequest],
        ) -> Result<Vec<BridgePrediction>, PredictionError> {
            // Encode the horizon into the probability for inspection
            Ok(batch
                .iter()
                .map(|r| BridgePrediction {
                    bridge_id: r.bridge_id.clone(),
                    probability: r.features.horizon_minutes() / 100.0,
                    confidence: 1.0,
                })
                .collect())
        }
    }

    let mut config = dfs_config();
    config.scoring.min_probability = 0.0;
    config.scoring.max_probability = 1.0;
    let analyzer = analyzer_with(config, &graph, Arc::new(Horizons));

    let now = departure() - chrono::Duration::minutes(10);
    let analysis = analyzer
        .analyze(&graph, &request("A", "C").with_now(now))
        .await
        .unwrap();

    // Bridge 1 is reached at departure, bridge 2 after 400 s
    assert!((analysis.paths[0].bridges[0].raw_probability - 0.10).abs() < 1e-12);
    let expected = (10.0 + 400.0 / 60.0) / 100.0;
    assert!((analysis.paths[1].bridges[0].raw_probability - expected).abs() < 1e-9);
}

#[test]
fn external_mode_requires_predictor() {
    let graph = scenario_graph();
    let mut config = Config::testing();
    config.prediction.mode = PredictionMode::External;

    let result = JourneyAnalyzer::new(
        config,
        &graph,
        AnalyzerSources::default(),
        Arc::new(PipelineMetrics::new()),
    );
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let graph = scenario_graph();
    let mut config = Config::testing();
    config.scoring.min_probability = 1.5;

    let result = JourneyAnalyzer::new(
        config,
        &graph,
        AnalyzerSources::default(),
        Arc::new(PipelineMetrics::new()),
    );
    assert!(matches!(result, Err(ConfigError::OutOfUnitRange { .. })));
}
