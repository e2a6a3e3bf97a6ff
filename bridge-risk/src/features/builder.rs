//! Feature construction.
//!
//! Features split in two parts. `BucketFeatures` depends only on the bridge
//! and the absolute 5-minute bucket, so it can be cached and shared between
//! every candidate path that reaches the bridge in that bucket.
//! `CrossingContext` depends on the candidate path set and is rebuilt per
//! crossing. Live signals can change at any time, so they are read when a
//! vector is assembled and never cached.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::time::{bucket_start, day_of_week_encoding, minute_of_day_encoding};
use crate::domain::{BridgeId, RoutePath, TimeBucket};
use crate::history::HistoricalDataProvider;
use crate::signals::SignalProvider;

use super::{
    BridgeCatalog, FeatureVector, MISSING, cross_rate, normalize_detour_delta,
    normalize_gate_anomaly, normalize_via_penalty,
};

/// Features that are a pure function of `(bridge, bucket)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketFeatures {
    /// Absolute 5-minute bucket index.
    pub bucket: i64,
    pub minute_sin: f64,
    pub minute_cos: f64,
    pub dow_sin: f64,
    pub dow_cos: f64,
    pub recent_open_5m: f64,
    pub recent_open_30m: f64,
}

/// Features of one crossing relative to the other candidate paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingContext {
    /// Minutes from now until the bridge is reached.
    pub horizon_min: f64,
    /// Seconds this path is slower than the fastest candidate.
    pub detour_delta_secs: f64,
    /// Some candidate avoids the bridge.
    pub via_routable: bool,
    /// Extra seconds of the fastest candidate avoiding the bridge.
    pub via_penalty_secs: f64,
    /// Share of candidates that avoid the bridge.
    pub detour_frac: f64,
}

impl CrossingContext {
    /// Context for `bridge` on `paths[path_index]`.
    ///
    /// With no candidate avoiding the bridge, the via penalty is saturated.
    pub fn from_candidates(
        bridge: &BridgeId,
        path_index: usize,
        paths: &[RoutePath],
        shortest_travel_time: f64,
        horizon_min: f64,
    ) -> Self {
        let path_time = paths
            .get(path_index)
            .map(|p| p.total_travel_time())
            .unwrap_or(f64::NAN);

        let avoiding: Vec<f64> = paths
            .iter()
            .filter(|p| !p.crosses(bridge))
            .map(|p| p.total_travel_time())
            .collect();

        let via_penalty_secs = avoiding
            .iter()
            .copied()
            .min_by(f64::total_cmp)
            .map_or(f64::INFINITY, |best| best - path_time);

        let detour_frac = if paths.is_empty() {
            MISSING
        } else {
            avoiding.len() as f64 / paths.len() as f64
        };

        Self {
            horizon_min: horizon_min.max(0.0),
            detour_delta_secs: path_time - shortest_travel_time,
            via_routable: !avoiding.is_empty(),
            via_penalty_secs,
            detour_frac,
        }
    }
}

/// Builds feature vectors from history, live signals and route context.
#[derive(Clone)]
pub struct FeatureBuilder {
    catalog: Arc<BridgeCatalog>,
    history: Option<Arc<dyn HistoricalDataProvider>>,
    signals: Option<Arc<dyn SignalProvider>>,
}

impl FeatureBuilder {
    pub fn new(catalog: BridgeCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            history: None,
            signals: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoricalDataProvider>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_signals(mut self, signals: Arc<dyn SignalProvider>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn catalog(&self) -> &BridgeCatalog {
        &self.catalog
    }

    /// Key-pure features for a bridge in an absolute bucket.
    pub fn bucket_features(&self, bridge: &BridgeId, bucket: i64) -> BucketFeatures {
        let start = bucket_start(bucket);
        let (minute_sin, minute_cos) = minute_of_day_encoding(start);
        let (dow_sin, dow_cos) = day_of_week_encoding(start);

        let rate = self
            .history
            .as_ref()
            .and_then(|h| h.open_rate(bridge, TimeBucket::from_datetime(start)));
        let (recent_open_5m, recent_open_30m) =
            rate.map_or((MISSING, MISSING), |r| (r.open_5m, r.open_30m));

        BucketFeatures {
            bucket,
            minute_sin,
            minute_cos,
            dow_sin,
            dow_cos,
            recent_open_5m,
            recent_open_30m,
        }
    }

    /// Combine cached and per-crossing parts with the bridge's current
    /// signals into a model input.
    pub fn assemble(
        &self,
        bridge: &BridgeId,
        bucket: &BucketFeatures,
        crossing: &CrossingContext,
    ) -> FeatureVector {
        let bridge_index = self.catalog.index_of(bridge).map_or(MISSING, |i| i as f64);

        let signals = self.signals.as_ref().and_then(|s| s.signals(bridge));
        let (cross, gate) = signals.map_or((MISSING, MISSING), |s| {
            (
                cross_rate(s.cross_k, s.cross_n),
                normalize_gate_anomaly(s.gate_anom),
            )
        });

        FeatureVector::new([
            bridge_index,
            crossing.horizon_min,
            bucket.minute_sin,
            bucket.minute_cos,
            bucket.dow_sin,
            bucket.dow_cos,
            bucket.recent_open_5m,
            bucket.recent_open_30m,
            normalize_detour_delta(crossing.detour_delta_secs),
            cross,
            if crossing.via_routable { 1.0 } else { 0.0 },
            normalize_via_penalty(crossing.via_penalty_secs),
            gate,
            crossing.detour_frac,
        ])
    }
}
