//! Live traffic signals per bridge.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::Serialize;

use crate::domain::BridgeId;
use crate::training::ProbeTick;

/// Most recent traffic observations around a bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeSignals {
    /// Vehicles that crossed in the last minute.
    pub cross_k: Option<f64>,
    /// Vehicles that attempted to cross in the last minute.
    pub cross_n: Option<f64>,
    /// Whether routing via the bridge is currently possible.
    pub via_routable: bool,
    /// Extra seconds a route via the bridge currently costs.
    pub via_penalty_sec: f64,
    /// Ratio of observed to expected gate ETA.
    pub gate_anom: f64,
    pub alternates_total: u32,
    pub alternates_avoid: u32,
    pub observed_at: NaiveDateTime,
}

impl BridgeSignals {
    /// Crossing rate `k / n`, or `None` when there is no traffic count.
    pub fn cross_rate(&self) -> Option<f64> {
        match (self.cross_k, self.cross_n) {
            (Some(k), Some(n)) if n > 0.0 => Some(k / n),
            _ => None,
        }
    }

    /// Fraction of alternative routes that avoid the bridge.
    pub fn detour_fraction(&self) -> Option<f64> {
        (self.alternates_total > 0)
            .then(|| self.alternates_avoid as f64 / self.alternates_total as f64)
    }
}

/// Source of live signals.
pub trait SignalProvider: Send + Sync {
    fn signals(&self, bridge: &BridgeId) -> Option<BridgeSignals>;
}

/// Signals taken from the latest probe tick seen for each bridge.
#[derive(Debug, Default)]
pub struct LatestTickSignals {
    latest: RwLock<HashMap<BridgeId, BridgeSignals>>,
}

impl LatestTickSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bridge's signals if `tick` is newer than what is held.
    pub fn observe(&self, tick: &ProbeTick) {
        let signals = BridgeSignals {
            cross_k: tick.cross_k,
            cross_n: tick.cross_n,
            via_routable: tick.via_routable,
            via_penalty_sec: tick.via_penalty_sec,
            gate_anom: tick.gate_anom,
            alternates_total: tick.alternates_total,
            alternates_avoid: tick.alternates_avoid,
            observed_at: tick.local_time(),
        };

        let mut latest = self.latest.write();
        let entry = latest.entry(tick.bridge());
        match entry {
            Entry::Occupied(mut held) => {
                if held.get().observed_at <= signals.observed_at {
                    held.insert(signals);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(signals);
            }
        }
    }

    pub fn from_ticks<'a>(ticks: impl IntoIterator<Item = &'a ProbeTick>) -> Self {
        let provider = Self::new();
        for tick in ticks {
            provider.observe(tick);
        }
        provider
    }
}

impl SignalProvider for LatestTickSignals {
    fn signals(&self, bridge: &BridgeId) -> Option<BridgeSignals> {
        self.latest.read().get(bridge).cloned()
    }
}
