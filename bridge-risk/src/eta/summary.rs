//! Statistical summary of an arrival time.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

const Z_90: f64 = 1.2816;
const Z_95: f64 = 1.6449;
const Z_99: f64 = 2.3263;

/// Distribution of an arrival time, as offsets in seconds from departure.
///
/// Percentiles are normal approximations clamped into `[min, max]`.
///
/// # Invariants
///
/// `min_secs <= mean_secs <= max_secs` and the percentiles are
/// non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtaSummary {
    pub departure: NaiveDateTime,
    pub mean_secs: f64,
    pub variance: f64,
    pub std_dev_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
    pub p90_secs: f64,
    pub p95_secs: f64,
    pub p99_secs: f64,
}

impl EtaSummary {
    /// Summary of a zero-length trip: everything equals departure.
    pub fn at_departure(departure: NaiveDateTime) -> Self {
        Self::from_moments(departure, 0.0, 0.0, 0.0, 0.0)
    }

    /// Build a summary from accumulated moments.
    pub fn from_moments(
        departure: NaiveDateTime,
        mean: f64,
        variance: f64,
        min: f64,
        max: f64,
    ) -> Self {
        let variance = variance.max(0.0);
        let std_dev = variance.sqrt();
        // Rounding in the running sums can nudge the mean just outside the range
        let min = min.min(mean);
        let max = max.max(mean);
        let percentile = |z: f64| (mean + z * std_dev).clamp(min, max);

        Self {
            departure,
            mean_secs: mean,
            variance,
            std_dev_secs: std_dev,
            min_secs: min,
            max_secs: max,
            p90_secs: percentile(Z_90),
            p95_secs: percentile(Z_95),
            p99_secs: percentile(Z_99),
        }
    }

    /// Clock time at an offset from departure.
    ///
    /// Saturates at the ends of the representable calendar.
    pub fn at_offset(&self, secs: f64) -> NaiveDateTime {
        let saturated = if secs < 0.0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        };
        Duration::try_milliseconds((secs * 1000.0).round() as i64)
            .and_then(|offset| self.departure.checked_add_signed(offset))
            .unwrap_or(saturated)
    }

    /// Expected arrival time.
    pub fn mean_time(&self) -> NaiveDateTime {
        self.at_offset(self.mean_secs)
    }

    pub fn earliest_time(&self) -> NaiveDateTime {
        self.at_offset(self.min_secs)
    }

    pub fn latest_time(&self) -> NaiveDateTime {
        self.at_offset(self.max_secs)
    }

    pub fn p90_time(&self) -> NaiveDateTime {
        self.at_offset(self.p90_secs)
    }

    pub fn p95_time(&self) -> NaiveDateTime {
        self.at_offset(self.p95_secs)
    }

    pub fn p99_time(&self) -> NaiveDateTime {
        self.at_offset(self.p99_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn departure() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 27)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn zero_trip() {
        let s = EtaSummary::at_departure(departure());
        assert_eq!(s.mean_time(), departure());
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.p99_time(), departure());
    }

    #[test]
    fn percentiles_use_normal_quantiles() {
        let s = EtaSummary::from_moments(departure(), 600.0, 100.0, 0.0, 10_000.0);
        assert_eq!(s.std_dev_secs, 10.0);
        assert!((s.p90_secs - 612.816).abs() < 1e-9);
        assert!((s.p95_secs - 616.449).abs() < 1e-9);
        assert!((s.p99_secs - 623.263).abs() < 1e-9);
    }

    #[test]
    fn percentiles_clamped_to_max() {
        let s = EtaSummary::from_moments(departure(), 600.0, 10_000.0, 500.0, 610.0);
        assert_eq!(s.p90_secs, 610.0);
        assert_eq!(s.p99_secs, 610.0);
        assert!(s.p90_secs <= s.p95_secs && s.p95_secs <= s.p99_secs);
    }

    #[test]
    fn clock_times() {
        let s = EtaSummary::from_moments(departure(), 90.0, 0.0, 60.0, 120.0);
        assert_eq!(s.mean_time(), departure() + Duration::seconds(90));
        assert_eq!(s.earliest_time(), departure() + Duration::seconds(60));
        assert_eq!(s.latest_time(), departure() + Duration::seconds(120));
    }

    #[test]
    fn far_offsets_saturate() {
        let s = EtaSummary::from_moments(departure(), 1e13, 0.0, 1e13, 1e13);
        assert_eq!(s.mean_time(), NaiveDateTime::MAX);
        assert_eq!(s.at_offset(-1e13), NaiveDateTime::MIN);
        assert_eq!(s.at_offset(f64::INFINITY), NaiveDateTime::MAX);
    }
}
