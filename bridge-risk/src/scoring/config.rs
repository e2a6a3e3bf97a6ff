//! Scoring bounds.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, check_unit};

/// Band every per-bridge probability is clamped into before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub min_probability: f64,
    pub max_probability: f64,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("scoring.min_probability", self.min_probability)?;
        check_unit("scoring.max_probability", self.max_probability)?;
        if self.min_probability > self.max_probability {
            return Err(ConfigError::InvertedBand {
                min: self.min_probability,
                max: self.max_probability,
            });
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_probability: 0.05,
            max_probability: 0.99,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band() {
        let config = ScoringConfig::default();
        assert_eq!(config.min_probability, 0.05);
        assert_eq!(config.max_probability, 0.99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_band() {
        let config = ScoringConfig {
            min_probability: 0.9,
            max_probability: 0.1,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBand { .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let config = ScoringConfig {
            min_probability: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
