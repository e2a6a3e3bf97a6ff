//! Historical baseline predictor.
//!
//! History counts lifts. The lift share in the bridge's 5-minute bucket is
//! smoothed with a Beta(α, β) prior and the prediction is its complement,
//! the probability that the bridge is down and open to road traffic:
//!
//! ```text
//! rate = (opens + α) / (samples + α + β)
//! p    = 1 - rate
//! ```
//!
//! Buckets with fewer than `min_samples` observations are blended toward
//! `default_probability` with weight `samples / min_samples`.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::domain::{BridgeId, TimeBucket};
use crate::history::HistoricalDataProvider;
use crate::metrics::PipelineMetrics;

use super::{
    BridgeOpeningPredictor, BridgePrediction, PredictionConfig, PredictionError, PredictionRequest,
};

/// Beta-smoothed historical predictor.
pub struct BaselinePredictor {
    config: PredictionConfig,
    history: Arc<dyn HistoricalDataProvider>,
    metrics: Arc<PipelineMetrics>,
}

impl BaselinePredictor {
    pub fn new(
        config: PredictionConfig,
        history: Arc<dyn HistoricalDataProvider>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            config,
            history,
            metrics,
        }
    }

    /// Passable probability and confidence from raw lift counts.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use bridge_risk::history::InMemoryHistory;
    /// use bridge_risk::metrics::PipelineMetrics;
    /// use bridge_risk::predict::{BaselinePredictor, PredictionConfig};
    ///
    /// let predictor = BaselinePredictor::new(
    ///     PredictionConfig::default(),
    ///     Arc::new(InMemoryHistory::new()),
    ///     Arc::new(PipelineMetrics::new()),
    /// );
    /// // 3 lifts in 10 samples with a uniform prior: 1 - 4 / 12
    /// let (p, _) = predictor.estimate(3.0, 10);
    /// assert!((p - 2.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn estimate(&self, opens: f64, samples: u32) -> (f64, f64) {
        let PredictionConfig {
            alpha,
            beta,
            default_probability,
            min_samples,
            ..
        } = self.config;
        let n = samples as f64;

        let rate = (opens + alpha) / (n + alpha + beta);
        let weight = if samples >= min_samples {
            1.0
        } else {
            n / min_samples as f64
        };

        let probability = weight * (1.0 - rate) + (1.0 - weight) * default_probability;
        let confidence = weight * n / (n + alpha + beta);
        (probability.clamp(0.0, 1.0), confidence)
    }

    fn predict_one(&self, req: &PredictionRequest) -> BridgePrediction {
        let bridge = &req.bridge_id;

        if !self.history.knows_bridge(bridge) {
            self.unsupported(bridge);
            return self.fallback(bridge);
        }

        let bucket = TimeBucket::from_datetime(req.eta);
        let Some(rate) = self.history.open_rate(bridge, bucket) else {
            trace!(%bridge, slot = bucket.slot, "No samples in bucket");
            return self.fallback(bridge);
        };

        let opens = rate.open_5m * rate.sample_count as f64;
        let (probability, confidence) = self.estimate(opens, rate.sample_count);
        BridgePrediction {
            bridge_id: bridge.clone(),
            probability,
            confidence,
        }
    }

    fn unsupported(&self, bridge: &BridgeId) {
        warn!(%bridge, "No history for bridge, using default probability");
        self.metrics.record_unsupported_bridge();
    }

    fn fallback(&self, bridge: &BridgeId) -> BridgePrediction {
        BridgePrediction {
            bridge_id: bridge.clone(),
            probability: self.config.default_probability,
            confidence: 0.0,
        }
    }
}

impl BridgeOpeningPredictor for BaselinePredictor {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError> {
        Ok(batch.iter().map(|req| self.predict_one(req)).collect())
    }
}
