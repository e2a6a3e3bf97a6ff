//! Time-of-day travel-time multipliers.

use chrono::NaiveDateTime;

use crate::domain::SegmentType;
use crate::domain::time::is_rush_hour;

use super::config::TrafficConfig;

/// Supplies a travel-time multiplier for a segment entered at a given time.
///
/// Implementations should return a finite positive value; anything else is
/// treated as 1 by the estimator.
pub trait TrafficProfileProvider: Send + Sync {
    fn multiplier(&self, at: NaiveDateTime, segment: SegmentType) -> f64;
}

/// Weekday rush-hour slowdowns, separate for roads and bridges.
#[derive(Debug, Clone)]
pub struct RushHourProfile {
    road: f64,
    bridge: f64,
}

impl RushHourProfile {
    pub fn new(road: f64, bridge: f64) -> Self {
        Self { road, bridge }
    }

    pub fn from_config(config: &TrafficConfig) -> Self {
        Self::new(
            config.rush_hour_road_multiplier,
            config.rush_hour_bridge_multiplier,
        )
    }
}

impl TrafficProfileProvider for RushHourProfile {
    fn multiplier(&self, at: NaiveDateTime, segment: SegmentType) -> f64 {
        if !is_rush_hour(at) {
            return 1.0;
        }
        match segment {
            SegmentType::Road => self.road,
            SegmentType::Bridge => self.bridge,
        }
    }
}
