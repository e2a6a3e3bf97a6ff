//! Historical bridge-opening data.
//!
//! An opening is a lift for vessel traffic, during which the bridge is closed
//! to road traffic. Opening rates are pooled per 5-minute slot of the day and
//! per day kind (weekday or weekend). Missing data is normal: a bucket with no samples
//! simply has no rate.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::domain::{BridgeId, TimeBucket};
use crate::training::{self, ProbeTick, TrainingError};

/// Slots before the current one included in the 30-minute share.
const SLOTS_IN_30M: u16 = 5;

/// Observed opening share for one bridge and time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenRate {
    /// Share of samples in this 5-minute bucket with the bridge lifting.
    pub open_5m: f64,

    /// Share over the bucket and the five preceding ones.
    pub open_30m: f64,

    /// Samples in this 5-minute bucket.
    pub sample_count: u32,

    /// Most recent observation of the bridge.
    pub last_seen: Option<NaiveDateTime>,
}

/// Source of historical opening rates.
///
/// Implementations must be cheap to query; the baseline predictor calls
/// `open_rate` once per bridge crossing.
pub trait HistoricalDataProvider: Send + Sync {
    /// Opening rate for a bridge in a time bucket, if any samples exist.
    fn open_rate(&self, bridge: &BridgeId, bucket: TimeBucket) -> Option<OpenRate>;

    /// Whether the provider has ever seen this bridge.
    fn knows_bridge(&self, bridge: &BridgeId) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
struct BucketCounts {
    opens: u32,
    samples: u32,
}

#[derive(Debug, Default)]
struct BridgeHistory {
    buckets: HashMap<TimeBucket, BucketCounts>,
    last_seen: Option<NaiveDateTime>,
}

/// Opening history held in memory.
///
/// Safe to share between threads; reads proceed concurrently and
/// `record` takes a short write lock.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    bridges: RwLock<HashMap<BridgeId, BridgeHistory>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of a bridge, `open` meaning lifted.
    pub fn record(&self, bridge: &BridgeId, at: NaiveDateTime, open: bool) {
        let mut bridges = self.bridges.write();
        let history = bridges.entry(bridge.clone()).or_default();

        let counts = history
            .buckets
            .entry(TimeBucket::from_datetime(at))
            .or_default();
        counts.samples += 1;
        if open {
            counts.opens += 1;
        }

        if history.last_seen.is_none_or(|seen| at > seen) {
            history.last_seen = Some(at);
        }
    }

    /// Build history from probe ticks.
    pub fn from_ticks<'a>(ticks: impl IntoIterator<Item = &'a ProbeTick>) -> Self {
        let history = Self::new();
        for tick in ticks {
            history.record(&tick.bridge(), tick.local_time(), tick.is_lifting());
        }
        history
    }

    /// Load history from an NDJSON probe-tick export.
    pub fn load_ndjson(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let ticks = training::load_ndjson(std::io::BufReader::new(file))?;
        let history = Self::from_ticks(&ticks);
        info!(
            path = %path.display(),
            ticks = ticks.len(),
            bridges = history.bridge_count(),
            "Loaded bridge history"
        );
        Ok(history)
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.read().len()
    }
}

impl HistoricalDataProvider for InMemoryHistory {
    fn open_rate(&self, bridge: &BridgeId, bucket: TimeBucket) -> Option<OpenRate> {
        let bridges = self.bridges.read();
        let history = bridges.get(bridge)?;
        let current = history.buckets.get(&bucket)?;
        if current.samples == 0 {
            return None;
        }

        let (opens_30m, samples_30m) = (0..=SLOTS_IN_30M)
            .filter_map(|n| history.buckets.get(&bucket.back(n)))
            .fold((0u32, 0u32), |(o, s), c| (o + c.opens, s + c.samples));

        Some(OpenRate {
            open_5m: current.opens as f64 / current.samples as f64,
            open_30m: opens_30m as f64 / samples_30m as f64,
            sample_count: current.samples,
            last_seen: history.last_seen,
        })
    }

    fn knows_bridge(&self, bridge: &BridgeId) -> bool {
        self.bridges.read().contains_key(bridge)
    }
}
