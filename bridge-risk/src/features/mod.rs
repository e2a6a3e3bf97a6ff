//! Model input features for bridge-opening prediction.
//!
//! A prediction input is a fixed vector of 14 values. The order and
//! normalisation are shared by serving (`builder`) and training data
//! preparation (`crate::training`), and versioned by `FEATURE_SCHEMA_VERSION`.
//!
//! | # | Name | Value |
//! |---|------|-------|
//! | 0 | `bridge_id` | Bridge index, the numeric id itself when there is one |
//! | 1 | `horizon_min` | Minutes from now until the bridge is reached |
//! | 2-3 | `min_sin`, `min_cos` | Minute of day, period 1440 |
//! | 4-5 | `dow_sin`, `dow_cos` | Day of week (Monday = 1), period 7 |
//! | 6-7 | `recent_open_5m`, `recent_open_30m` | Share of recent samples with the bridge open |
//! | 8 | `detour_delta` | Seconds, clipped to +/-900 |
//! | 9 | `cross_rate_1m` | Vehicles crossed / attempted, -1 when unknown |
//! | 10 | `via_routable` | 0 or 1 |
//! | 11 | `via_penalty` | Seconds clipped to [0, 900], divided by 900 |
//! | 12 | `gate_anom` | Ratio clipped to [1, 8], divided by 8 |
//! | 13 | `detour_frac` | Fraction of alternatives avoiding the bridge |
//!
//! Non-finite values never leave this module: they become the sentinel `-1`.

mod builder;
mod cache;

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{BridgeId, Graph};

pub use builder::{BucketFeatures, CrossingContext, FeatureBuilder};
pub use cache::FeatureCache;

/// Version of the feature layout; bump on any change to order or scaling.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Number of values in a feature vector.
pub const FEATURE_COUNT: usize = 14;

/// Stand-in for missing or non-finite values.
pub const MISSING: f64 = -1.0;

/// Column names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "bridge_id",
    "horizon_min",
    "min_sin",
    "min_cos",
    "dow_sin",
    "dow_cos",
    "recent_open_5m",
    "recent_open_30m",
    "detour_delta",
    "cross_rate_1m",
    "via_routable",
    "via_penalty",
    "gate_anom",
    "detour_frac",
];

const DETOUR_DELTA_LIMIT_SECS: f64 = 900.0;
const VIA_PENALTY_LIMIT_SECS: f64 = 900.0;
const GATE_ANOM_MIN: f64 = 1.0;
const GATE_ANOM_MAX: f64 = 8.0;

/// Replace NaN and infinities with `MISSING`.
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() { x } else { MISSING }
}

/// Detour delta in seconds, clipped to +/-900.
pub fn normalize_detour_delta(secs: f64) -> f64 {
    secs.clamp(-DETOUR_DELTA_LIMIT_SECS, DETOUR_DELTA_LIMIT_SECS)
}

/// Via penalty clipped to [0, 900] seconds and scaled to [0, 1].
pub fn normalize_via_penalty(secs: f64) -> f64 {
    secs.clamp(0.0, VIA_PENALTY_LIMIT_SECS) / VIA_PENALTY_LIMIT_SECS
}

/// Gate anomaly ratio clipped to [1, 8] and divided by 8.
pub fn normalize_gate_anomaly(ratio: f64) -> f64 {
    ratio.clamp(GATE_ANOM_MIN, GATE_ANOM_MAX) / GATE_ANOM_MAX
}

/// Crossing rate `k / n`, or `MISSING` when either count is absent or `n` is zero.
pub fn cross_rate(k: Option<f64>, n: Option<f64>) -> f64 {
    match (k, n) {
        (Some(k), Some(n)) if n > 0.0 => sanitize(k / n),
        _ => MISSING,
    }
}

/// A complete, sanitized model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values, replacing any non-finite value with `MISSING`.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values.map(sanitize))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn bridge_index(&self) -> f64 {
        self.0[0]
    }

    pub fn horizon_minutes(&self) -> f64 {
        self.0[1]
    }
}

/// Maps bridge identifiers to their feature index.
///
/// A numeric identifier is its own index, so the value does not depend on
/// which other bridges a data source happens to contain. Non-numeric
/// identifiers follow the largest numeric one, in lexical order.
#[derive(Debug, Clone, Default)]
pub struct BridgeCatalog {
    index: HashMap<BridgeId, usize>,
}

impl BridgeCatalog {
    /// Catalog of the given bridges, which must already be in canonical order.
    pub fn from_ordered(ids: impl IntoIterator<Item = BridgeId>) -> Self {
        let ids: Vec<BridgeId> = ids.into_iter().collect();
        let mut next_named = ids
            .iter()
            .filter_map(BridgeId::as_number)
            .max()
            .map_or(0, |n| n as usize + 1);

        let index = ids
            .into_iter()
            .map(|id| {
                let i = match id.as_number() {
                    Some(n) => n as usize,
                    None => {
                        next_named += 1;
                        next_named - 1
                    }
                };
                (id, i)
            })
            .collect();
        Self { index }
    }

    /// Catalog of every bridge in the graph.
    pub fn from_graph(graph: &Graph) -> Self {
        Self::from_ordered(graph.bridge_ids())
    }

    pub fn index_of(&self, bridge: &BridgeId) -> Option<usize> {
        self.index.get(bridge).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
