//! ETA estimator configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, check_non_negative, check_positive};

/// Rush-hour traffic multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrafficConfig {
    /// Install the bundled rush-hour profile.
    pub enabled: bool,

    /// Road travel-time multiplier during rush hour.
    pub rush_hour_road_multiplier: f64,

    /// Bridge travel-time multiplier during rush hour.
    pub rush_hour_bridge_multiplier: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rush_hour_road_multiplier: 1.35,
            rush_hour_bridge_multiplier: 1.2,
        }
    }
}

/// Spread of per-edge travel times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtaConfig {
    /// Standard deviation as a fraction of the mean.
    pub travel_time_cv: f64,

    /// Fastest plausible traversal, as a fraction of the mean.
    pub min_factor: f64,

    /// Slowest plausible traversal, as a multiple of the mean.
    pub max_factor: f64,

    pub traffic: TrafficConfig,
}

impl EtaConfig {
    /// Check the spread parameters.
    ///
    /// # Invariants
    ///
    /// `0 < min_factor <= 1 <= max_factor`, which guarantees
    /// `min <= mean <= max` for every summary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("eta.travel_time_cv", self.travel_time_cv)?;
        check_positive("eta.min_factor", self.min_factor)?;
        check_positive("eta.max_factor", self.max_factor)?;
        if self.min_factor > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "eta.min_factor must be at most 1, got {}",
                self.min_factor
            )));
        }
        if self.max_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "eta.max_factor must be at least 1, got {}",
                self.max_factor
            )));
        }
        check_positive(
            "eta.traffic.rush_hour_road_multiplier",
            self.traffic.rush_hour_road_multiplier,
        )?;
        check_positive(
            "eta.traffic.rush_hour_bridge_multiplier",
            self.traffic.rush_hour_bridge_multiplier,
        )?;
        Ok(())
    }
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            travel_time_cv: 0.15,
            min_factor: 0.85,
            max_factor: 1.6,
            traffic: TrafficConfig::default(),
        }
    }
}
