//! Bridge-opening prediction.
//!
//! A predictor answers, for a batch of bridge crossings, how likely each
//! bridge is to be open to road traffic when the traveler reaches it.
//! Implementations are selected by `PredictionMode`; callers only see
//! `dyn BridgeOpeningPredictor`.

mod baseline;
mod mock;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ConfigError, check_positive, check_unit};
use crate::domain::BridgeId;
use crate::features::FeatureVector;
use crate::history::{HistoricalDataProvider, InMemoryHistory};
use crate::metrics::PipelineMetrics;

pub use baseline::BaselinePredictor;
pub use mock::SeededMockPredictor;

/// Error from a prediction backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    /// Backend returned a different number of results than requested
    #[error("predictor returned {actual} results for a batch of {expected}")]
    BatchLengthMismatch { expected: usize, actual: usize },

    /// Backend failed
    #[error("prediction backend failed: {0}")]
    Backend(String),
}

/// One bridge crossing to predict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub bridge_id: BridgeId,
    /// Expected time the traveler reaches the bridge.
    pub eta: NaiveDateTime,
    pub features: FeatureVector,
}

/// Prediction for one crossing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgePrediction {
    pub bridge_id: BridgeId,
    /// Probability the bridge is open to traffic, in [0, 1].
    pub probability: f64,
    /// How much the backend trusts the probability, in [0, 1].
    pub confidence: f64,
}

/// Batch bridge-opening predictor.
///
/// # Invariants
///
/// `predict_batch` returns exactly one result per request, in request order.
pub trait BridgeOpeningPredictor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError>;
}

/// Run a batch and check the backend honoured the length contract.
pub fn predict_checked(
    predictor: &dyn BridgeOpeningPredictor,
    batch: &[PredictionRequest],
) -> Result<Vec<BridgePrediction>, PredictionError> {
    let predictions = predictor.predict_batch(batch)?;
    if predictions.len() != batch.len() {
        return Err(PredictionError::BatchLengthMismatch {
            expected: batch.len(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}

/// Which predictor to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionMode {
    /// Deterministic pseudo-random probabilities.
    Mock { seed: u64 },
    /// Beta-smoothed historical opening rates.
    Baseline,
    /// A predictor supplied by the caller.
    External,
}

/// Prediction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictionConfig {
    pub mode: PredictionMode,

    /// Beta prior pseudo-count of lift observations.
    pub alpha: f64,

    /// Beta prior pseudo-count of observations with the bridge down.
    pub beta: f64,

    /// Probability used for unknown bridges and sparse buckets.
    pub default_probability: f64,

    /// Buckets with fewer samples are blended toward `default_probability`.
    pub min_samples: u32,
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("prediction.alpha", self.alpha)?;
        check_positive("prediction.beta", self.beta)?;
        check_unit("prediction.default_probability", self.default_probability)?;
        Ok(())
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            mode: PredictionMode::Baseline,
            alpha: 1.0,
            beta: 1.0,
            default_probability: 0.85,
            min_samples: 10,
        }
    }
}

/// Build the predictor selected by `config.mode`.
///
/// Baseline mode without a history provider predicts from an empty history,
/// so every bridge falls back to the default probability.
///
/// # Errors
///
/// Returns `ConfigError` for `PredictionMode::External`; that mode needs a
/// predictor injected by the caller.
pub fn build_predictor(
    config: &PredictionConfig,
    history: Option<Arc<dyn HistoricalDataProvider>>,
    metrics: Arc<PipelineMetrics>,
) -> Result<Arc<dyn BridgeOpeningPredictor>, ConfigError> {
    match &config.mode {
        PredictionMode::Mock { seed } => Ok(Arc::new(SeededMockPredictor::new(*seed))),
        PredictionMode::Baseline => {
            let history = history.unwrap_or_else(|| {
                warn!("Baseline prediction without history; using default probability");
                Arc::new(InMemoryHistory::new())
            });
            Ok(Arc::new(BaselinePredictor::new(
                config.clone(),
                history,
                metrics,
            )))
        }
        PredictionMode::External => Err(ConfigError::Invalid(
            "prediction.mode is external but no predictor was supplied".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Short;

    impl BridgeOpeningPredictor for Short {
        fn name(&self) -> &'static str {
            "short"
        }

        fn predict_batch(
            &self,
            _batch: &[PredictionRequest],
        ) -> Result<Vec<BridgePrediction>, PredictionError> {
            Ok(Vec::new())
        }
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            bridge_id: BridgeId::new("1"),
            eta: chrono::NaiveDate::from_ymd_opt(2025, 1, 27)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            features: FeatureVector::new([0.0; crate::features::FEATURE_COUNT]),
        }
    }

    #[test]
    fn length_mismatch_detected() {
        let err = predict_checked(&Short, &[request()]).unwrap_err();
        assert_eq!(
            err,
            PredictionError::BatchLengthMismatch {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn factory_by_mode() {
        let metrics = Arc::new(PipelineMetrics::new());

        let mock = PredictionConfig {
            mode: PredictionMode::Mock { seed: 1 },
            ..Default::default()
        };
        assert_eq!(
            build_predictor(&mock, None, metrics.clone())
                .unwrap()
                .name(),
            "mock"
        );

        let baseline = PredictionConfig::default();
        assert_eq!(
            build_predictor(&baseline, None, metrics.clone())
                .unwrap()
                .name(),
            "baseline"
        );

        let external = PredictionConfig {
            mode: PredictionMode::External,
            ..Default::default()
        };
        assert!(matches!(
            build_predictor(&external, None, metrics),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_validation() {
        assert!(PredictionConfig::default().validate().is_ok());

        let config = PredictionConfig {
            alpha: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PredictionConfig {
            default_probability: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { .. })
        ));
    }

    #[test]
    fn mode_serde_tagged() {
        let json = serde_json::to_string(&PredictionMode::Mock { seed: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"mock","seed":3}"#);
        let mode: PredictionMode = serde_json::from_str(r#"{"kind":"baseline"}"#).unwrap();
        assert_eq!(mode, PredictionMode::Baseline);
    }
}
