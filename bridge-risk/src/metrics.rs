//! Pipeline counters and stage timers.
//!
//! Everything is a relaxed atomic so hot paths never contend on a lock.
//! Callers read a consistent-enough view through `snapshot`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Timed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enumeration,
    Eta,
    Features,
    Prediction,
    Total,
}

#[derive(Debug, Default)]
struct StageTimer {
    count: AtomicU64,
    total_micros: AtomicU64,
    max_micros: AtomicU64,
}

impl StageTimer {
    fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
        self.max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StageSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total_micros = self.total_micros.load(Ordering::Relaxed);
        StageSnapshot {
            count,
            total_micros,
            max_micros: self.max_micros.load(Ordering::Relaxed),
            mean_micros: if count == 0 {
                0.0
            } else {
                total_micros as f64 / count as f64
            },
        }
    }
}

/// Counters and timers for journey analysis.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    requests: AtomicU64,
    failed_requests: AtomicU64,
    timeouts: AtomicU64,
    paths_enumerated: AtomicU64,
    empty_results: AtomicU64,
    crossings_predicted: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    unsupported_bridges: AtomicU64,
    non_finite_predictions: AtomicU64,
    enumeration: StageTimer,
    eta: StageTimer,
    features: StageTimer,
    prediction: StageTimer,
    total: StageTimer,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn timer(&self, stage: Stage) -> &StageTimer {
        match stage {
            Stage::Enumeration => &self.enumeration,
            Stage::Eta => &self.eta,
            Stage::Features => &self.features,
            Stage::Prediction => &self.prediction,
            Stage::Total => &self.total,
        }
    }

    pub fn record_duration(&self, stage: Stage, elapsed: Duration) {
        self.timer(stage).record(elapsed);
    }

    /// Start timing a stage; the elapsed time is recorded when the guard drops.
    pub fn start(&self, stage: Stage) -> TimerGuard<'_> {
        TimerGuard {
            metrics: self,
            stage,
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_paths(&self, n: usize) {
        self.paths_enumerated.fetch_add(n as u64, Ordering::Relaxed);
        if n == 0 {
            self.empty_results.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_crossings(&self, n: usize) {
        self.crossings_predicted
            .fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.cache_hits
        } else {
            &self.cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unsupported_bridge(&self) {
        self.unsupported_bridges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_finite_prediction(&self) {
        self.non_finite_predictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests: load(&self.requests),
            failed_requests: load(&self.failed_requests),
            timeouts: load(&self.timeouts),
            paths_enumerated: load(&self.paths_enumerated),
            empty_results: load(&self.empty_results),
            crossings_predicted: load(&self.crossings_predicted),
            cache_hits: load(&self.cache_hits),
            cache_misses: load(&self.cache_misses),
            unsupported_bridges: load(&self.unsupported_bridges),
            non_finite_predictions: load(&self.non_finite_predictions),
            enumeration: self.enumeration.snapshot(),
            eta: self.eta.snapshot(),
            features: self.features.snapshot(),
            prediction: self.prediction.snapshot(),
            total: self.total.snapshot(),
        }
    }
}

/// Records a stage duration on drop.
pub struct TimerGuard<'a> {
    metrics: &'a PipelineMetrics,
    stage: Stage,
    started: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_duration(self.stage, self.started.elapsed());
    }
}

/// Point-in-time view of one stage timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSnapshot {
    pub count: u64,
    pub total_micros: u64,
    pub max_micros: u64,
    pub mean_micros: f64,
}

/// Point-in-time view of all metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub failed_requests: u64,
    pub timeouts: u64,
    pub paths_enumerated: u64,
    pub empty_results: u64,
    pub crossings_predicted: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub unsupported_bridges: u64,
    pub non_finite_predictions: u64,
    pub enumeration: StageSnapshot,
    pub eta: StageSnapshot,
    pub features: StageSnapshot,
    pub prediction: StageSnapshot,
    pub total: StageSnapshot,
}

impl MetricsSnapshot {
    /// Share of feature lookups served from the cache.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}
