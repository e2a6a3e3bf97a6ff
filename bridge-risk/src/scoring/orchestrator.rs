//! End-to-end journey analysis.
//!
//! Enumerates candidate paths, estimates when each bridge is reached,
//! builds one feature vector per crossing, predicts all crossings in a
//! single batch, and aggregates path and network probabilities.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::domain::time::absolute_bucket;
use crate::domain::{Graph, NodeId, RoutePath};
use crate::eta::{EtaEstimator, PathEta, TrafficProfileProvider};
use crate::features::{BridgeCatalog, CrossingContext, FeatureBuilder, FeatureCache};
use crate::history::HistoricalDataProvider;
use crate::metrics::{PipelineMetrics, Stage};
use crate::planner::{EnumerationResult, PathEnumerator, PlannerError};
use crate::predict::{
    BridgeOpeningPredictor, BridgePrediction, PredictionError, PredictionRequest, build_predictor,
    predict_checked,
};
use crate::signals::SignalProvider;

use super::aggregate::{any_path_probability, score_path};
use super::analysis::{BridgeScore, JourneyAnalysis, PathScore};

/// Error from journey analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    /// Analysis did not finish in time
    #[error("analysis timed out after {0:?}")]
    Timeout(Duration),

    /// The prediction task panicked or was cancelled
    #[error("prediction task failed: {0}")]
    Task(String),
}

/// A journey to analyse.
#[derive(Debug, Clone)]
pub struct JourneyRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub departure: NaiveDateTime,
    /// Reference time for prediction horizons; defaults to `departure`.
    pub now: Option<NaiveDateTime>,
}

impl JourneyRequest {
    pub fn new(source: NodeId, destination: NodeId, departure: NaiveDateTime) -> Self {
        Self {
            source,
            destination,
            departure,
            now: None,
        }
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }
}

/// Optional data sources feeding features and ETAs.
#[derive(Clone, Default)]
pub struct AnalyzerSources {
    pub history: Option<Arc<dyn HistoricalDataProvider>>,
    pub signals: Option<Arc<dyn SignalProvider>>,
    pub traffic: Option<Arc<dyn TrafficProfileProvider>>,
}

/// Scores journeys against one graph and configuration.
///
/// Owns the feature cache; share the analyzer (for example behind an `Arc`)
/// to share the cache between requests.
pub struct JourneyAnalyzer {
    config: Config,
    eta: EtaEstimator,
    features: FeatureBuilder,
    cache: FeatureCache,
    predictor: Arc<dyn BridgeOpeningPredictor>,
    metrics: Arc<PipelineMetrics>,
}

impl JourneyAnalyzer {
    /// Build an analyzer with the predictor selected by `config.prediction.mode`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or selects an
    /// external predictor (use `with_predictor` for that).
    pub fn new(
        config: Config,
        graph: &Graph,
        sources: AnalyzerSources,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let predictor =
            build_predictor(&config.prediction, sources.history.clone(), metrics.clone())?;
        Ok(Self::assemble(config, graph, sources, predictor, metrics))
    }

    /// Build an analyzer around a caller-supplied predictor.
    pub fn with_predictor(
        config: Config,
        graph: &Graph,
        sources: AnalyzerSources,
        predictor: Arc<dyn BridgeOpeningPredictor>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, graph, sources, predictor, metrics))
    }

    fn assemble(
        config: Config,
        graph: &Graph,
        sources: AnalyzerSources,
        predictor: Arc<dyn BridgeOpeningPredictor>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let mut eta = EtaEstimator::from_config(&config.eta);
        if let Some(traffic) = sources.traffic {
            eta = eta.with_traffic(traffic);
        }

        let mut features = FeatureBuilder::new(BridgeCatalog::from_graph(graph));
        if let Some(history) = sources.history {
            features = features.with_history(history);
        }
        if let Some(signals) = sources.signals {
            features = features.with_signals(signals);
        }

        info!(
            predictor = predictor.name(),
            concurrency = config.performance.effective_concurrency(),
            cache_capacity = config.performance.feature_cache_capacity,
            "Journey analyzer ready"
        );

        Self {
            cache: FeatureCache::new(&config.performance),
            config,
            eta,
            features,
            predictor,
            metrics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn feature_cache(&self) -> &FeatureCache {
        &self.cache
    }

    /// Enumerate candidate paths only.
    pub fn enumerate(
        &self,
        graph: &Graph,
        source: &NodeId,
        destination: &NodeId,
    ) -> Result<EnumerationResult, PlannerError> {
        let _timer = self.metrics.start(Stage::Enumeration);
        PathEnumerator::new(&self.config.enumeration).enumerate(graph, source, destination)
    }

    /// Analyse a journey.
    ///
    /// An unreachable destination is not an error: the result has no paths
    /// and `any_path_ok == 0`.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Planner` for unknown endpoints and
    /// `AnalysisError::Prediction` if the predictor fails.
    pub async fn analyze(
        &self,
        graph: &Graph,
        request: &JourneyRequest,
    ) -> Result<JourneyAnalysis, AnalysisError> {
        self.metrics.record_request();
        let _timer = self.metrics.start(Stage::Total);

        let result = self.run(graph, request).await;
        if let Err(e) = &result {
            warn!(error = %e, source = %request.source, destination = %request.destination, "Analysis failed");
            self.metrics.record_failure();
        }
        result
    }

    /// Analyse a journey, giving up after `limit`.
    pub async fn analyze_with_timeout(
        &self,
        graph: &Graph,
        request: &JourneyRequest,
        limit: Duration,
    ) -> Result<JourneyAnalysis, AnalysisError> {
        match tokio::time::timeout(limit, self.analyze(graph, request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?limit, source = %request.source, destination = %request.destination, "Analysis timed out");
                self.metrics.record_timeout();
                Err(AnalysisError::Timeout(limit))
            }
        }
    }

    async fn run(
        &self,
        graph: &Graph,
        request: &JourneyRequest,
    ) -> Result<JourneyAnalysis, AnalysisError> {
        let enumeration = self.enumerate(graph, &request.source, &request.destination)?;
        self.metrics.record_paths(enumeration.paths.len());

        if enumeration.paths.is_empty() {
            debug!(source = %request.source, destination = %request.destination, "No candidate paths");
            return Ok(JourneyAnalysis {
                paths: Vec::new(),
                any_path_ok: 0.0,
                strategy: enumeration.strategy,
                departure: request.departure,
                shortest_travel_time: enumeration.shortest_travel_time,
            });
        }

        let etas: Vec<PathEta> = {
            let _timer = self.metrics.start(Stage::Eta);
            enumeration
                .paths
                .iter()
                .map(|p| self.eta.estimate(p, request.departure))
                .collect()
        };

        let batch = {
            let _timer = self.metrics.start(Stage::Features);
            self.build_batch(
                &enumeration,
                &etas,
                request.now.unwrap_or(request.departure),
            )
            .await
        };
        self.metrics.record_crossings(batch.len());

        let predictions = {
            let _timer = self.metrics.start(Stage::Prediction);
            self.predict(batch).await?
        };

        let paths = self.score(enumeration.paths, etas, predictions);
        let probabilities: Vec<f64> = paths.iter().map(|p| p.probability).collect();
        let any_path_ok = any_path_probability(&probabilities);

        info!(
            source = %request.source,
            destination = %request.destination,
            paths = paths.len(),
            any_path_ok,
            "Journey analysed"
        );

        Ok(JourneyAnalysis {
            paths,
            any_path_ok,
            strategy: enumeration.strategy,
            departure: request.departure,
            shortest_travel_time: enumeration.shortest_travel_time,
        })
    }

    /// One prediction request per crossing, in path order then crossing order.
    async fn build_batch(
        &self,
        enumeration: &EnumerationResult,
        etas: &[PathEta],
        now: NaiveDateTime,
    ) -> Vec<PredictionRequest> {
        let paths = &enumeration.paths;
        let shortest = enumeration.shortest_travel_time.unwrap_or(f64::NAN);

        let crossings = etas
            .iter()
            .enumerate()
            .flat_map(|(i, eta)| eta.bridges.iter().map(move |b| (i, b)))
            .collect::<Vec<_>>();

        let requests: Vec<_> = crossings
            .into_iter()
            .map(|(path_index, crossing)| async move {
                let at = crossing.eta.mean_time();
                let bucket = absolute_bucket(at);
                let (bucket_features, hit) = self
                    .cache
                    .get_or_build(&crossing.bridge_id, bucket, &self.features)
                    .await;
                self.metrics.record_cache_lookup(hit);

                let horizon_min = (at - now).num_seconds() as f64 / 60.0;
                let context = CrossingContext::from_candidates(
                    &crossing.bridge_id,
                    path_index,
                    paths,
                    shortest,
                    horizon_min,
                );

                PredictionRequest {
                    bridge_id: crossing.bridge_id.clone(),
                    eta: at,
                    features: self.features.assemble(
                        &crossing.bridge_id,
                        &bucket_features,
                        &context,
                    ),
                }
            })
            .collect();

        stream::iter(requests)
            .buffered(self.config.performance.effective_concurrency())
            .collect()
            .await
    }

    /// Run the whole batch on the blocking pool.
    async fn predict(
        &self,
        batch: Vec<PredictionRequest>,
    ) -> Result<Vec<BridgePrediction>, AnalysisError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let predictor = Arc::clone(&self.predictor);
        let predictions =
            tokio::task::spawn_blocking(move || predict_checked(predictor.as_ref(), &batch))
                .await
                .map_err(|e| AnalysisError::Task(e.to_string()))??;

        Ok(predictions)
    }

    fn score(
        &self,
        paths: Vec<RoutePath>,
        etas: Vec<PathEta>,
        predictions: Vec<BridgePrediction>,
    ) -> Vec<PathScore> {
        let mut predictions = predictions.into_iter();

        paths
            .into_iter()
            .zip(etas)
            .map(|(path, eta)| {
                let raw: Vec<(BridgePrediction, _)> = eta
                    .bridges
                    .into_iter()
                    .zip(predictions.by_ref())
                    .map(|(crossing, prediction)| (prediction, crossing))
                    .collect();

                let raw_probabilities: Vec<f64> = raw
                    .iter()
                    .map(|(prediction, _)| self.finite_probability(prediction))
                    .collect();
                let (clamped, log_probability, probability) =
                    score_path(&raw_probabilities, &self.config.scoring);

                let bridges = raw
                    .into_iter()
                    .zip(raw_probabilities)
                    .zip(clamped)
                    .map(
                        |(((prediction, crossing), raw_probability), clamped_probability)| {
                            BridgeScore {
                                bridge_id: crossing.bridge_id,
                                edge_position: crossing.edge_position,
                                eta: crossing.eta,
                                raw_probability,
                                clamped_probability,
                                confidence: prediction.confidence,
                            }
                        },
                    )
                    .collect();

                PathScore {
                    path,
                    log_probability,
                    probability,
                    arrival: eta.arrival,
                    bridges,
                }
            })
            .collect()
    }

    fn finite_probability(&self, prediction: &BridgePrediction) -> f64 {
        if prediction.probability.is_finite() {
            prediction.probability
        } else {
            warn!(
                bridge = %prediction.bridge_id,
                probability = prediction.probability,
                "Predictor returned a non-finite probability, using default"
            );
            self.metrics.record_non_finite_prediction();
            self.config.prediction.default_probability
        }
    }
}
