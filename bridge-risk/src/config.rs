//! Run configuration.
//!
//! `Config` composes the per-component settings into one immutable value
//! that is built once per process and shared by reference. It is loaded from
//! JSON (unknown fields rejected, missing sections defaulted) and validated
//! before anything uses it, so invalid bounds are never discovered
//! mid-computation.
//!
//! Named presets (`development`, `production`, `testing`) keep tuning values
//! in one place instead of scattered through call sites.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::eta::EtaConfig;
use crate::planner::{EnumerationConfig, EnumerationMode};
use crate::predict::{PredictionConfig, PredictionMode};
use crate::scoring::ScoringConfig;

/// Hard ceiling on worker concurrency, regardless of core count.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Value must lie in [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    /// Value must be finite and strictly positive
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// Value must be finite and non-negative
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// Lower probability bound above upper bound
    #[error("probability band is inverted: min {min} > max {max}")]
    InvertedBand { min: f64, max: f64 },

    /// Any other inconsistency
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

pub(crate) fn check_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value: 0.0 })
    }
}

/// Concurrency and memory caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformanceConfig {
    /// Upper bound on concurrent feature-construction tasks.
    pub max_concurrency: usize,

    /// Maximum number of cached feature entries.
    pub feature_cache_capacity: u64,

    /// Lifetime of a cached feature entry, in seconds.
    pub feature_cache_ttl_secs: u64,

    /// Deadline for one HTTP analysis request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl PerformanceConfig {
    /// Concurrency actually used: the configured cap, never more than the core count.
    pub fn effective_concurrency(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_concurrency.min(cores).max(1)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_nonzero("performance.max_concurrency", self.max_concurrency)?;
        check_nonzero(
            "performance.feature_cache_capacity",
            self.feature_cache_capacity as usize,
        )?;
        check_nonzero(
            "performance.feature_cache_ttl_secs",
            self.feature_cache_ttl_secs as usize,
        )?;
        check_nonzero(
            "performance.request_timeout_ms",
            self.request_timeout_ms as usize,
        )?;
        Ok(())
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            feature_cache_capacity: 10_000,
            feature_cache_ttl_secs: 300,
            request_timeout_ms: 5_000,
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub enumeration: EnumerationConfig,
    pub eta: EtaConfig,
    pub scoring: ScoringConfig,
    pub performance: PerformanceConfig,
    pub prediction: PredictionConfig,
}

impl Config {
    /// Local development: seeded mock predictions, small cache.
    pub fn development() -> Self {
        Self {
            enumeration: EnumerationConfig::default(),
            eta: EtaConfig::default(),
            scoring: ScoringConfig::default(),
            performance: PerformanceConfig {
                max_concurrency: 2,
                feature_cache_capacity: 1_000,
                feature_cache_ttl_secs: 60,
                ..PerformanceConfig::default()
            },
            prediction: PredictionConfig {
                mode: PredictionMode::Mock { seed: 42 },
                ..PredictionConfig::default()
            },
        }
    }

    /// Production: historical baseline predictions, full cache.
    pub fn production() -> Self {
        Self::default()
    }

    /// Tests: deterministic DFS, single worker, fixed mock seed.
    pub fn testing() -> Self {
        Self {
            enumeration: EnumerationConfig {
                mode: EnumerationMode::Dfs,
                ..EnumerationConfig::default()
            },
            eta: EtaConfig::default(),
            scoring: ScoringConfig::default(),
            performance: PerformanceConfig {
                max_concurrency: 1,
                feature_cache_capacity: 128,
                feature_cache_ttl_secs: 60,
                ..PerformanceConfig::default()
            },
            prediction: PredictionConfig {
                mode: PredictionMode::Mock { seed: 7 },
                ..PredictionConfig::default()
            },
        }
    }

    /// Look up a preset by name (`development`, `production`, `testing`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::development()),
            "production" | "prod" => Some(Self::production()),
            "testing" | "test" => Some(Self::testing()),
            _ => None,
        }
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.enumeration.validate()?;
        self.eta.validate()?;
        self.scoring.validate()?;
        self.performance.validate()?;
        self.prediction.validate()?;
        Ok(())
    }
}
