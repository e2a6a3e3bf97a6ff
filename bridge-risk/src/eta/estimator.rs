//! Arrival-time estimation along a path.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

use crate::domain::{BridgeId, Edge, RoutePath};

use super::config::EtaConfig;
use super::summary::EtaSummary;
use super::traffic::{RushHourProfile, TrafficProfileProvider};

/// Arrival distribution at one bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeEta {
    pub bridge_id: BridgeId,
    /// Index of the bridge edge within the path.
    pub edge_position: usize,
    /// Time the traveler reaches the bridge, before crossing it.
    pub eta: EtaSummary,
}

/// ETA estimates for a whole path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEta {
    pub departure: NaiveDateTime,
    pub arrival: EtaSummary,
    /// One entry per bridge crossing, in path order.
    pub bridges: Vec<BridgeEta>,
}

/// Running sums over edges traversed so far.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    mean: f64,
    variance: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn summary(&self, departure: NaiveDateTime) -> EtaSummary {
        EtaSummary::from_moments(departure, self.mean, self.variance, self.min, self.max)
    }
}

/// Estimates arrival times along a path.
pub struct EtaEstimator {
    config: EtaConfig,
    traffic: Option<Arc<dyn TrafficProfileProvider>>,
}

impl EtaEstimator {
    /// Estimator without traffic adjustment.
    pub fn new(config: EtaConfig) -> Self {
        Self {
            config,
            traffic: None,
        }
    }

    /// Estimator with the bundled rush-hour profile when the config enables it.
    pub fn from_config(config: &EtaConfig) -> Self {
        let estimator = Self::new(config.clone());
        if config.traffic.enabled {
            estimator.with_traffic(Arc::new(RushHourProfile::from_config(&config.traffic)))
        } else {
            estimator
        }
    }

    pub fn with_traffic(mut self, traffic: Arc<dyn TrafficProfileProvider>) -> Self {
        self.traffic = Some(traffic);
        self
    }

    fn multiplier(&self, at: NaiveDateTime, edge: &Edge) -> f64 {
        let Some(traffic) = &self.traffic else {
            return 1.0;
        };
        let m = traffic.multiplier(at, edge.segment_type());
        if m.is_finite() && m > 0.0 {
            m
        } else {
            warn!(
                multiplier = m,
                from = %edge.from,
                to = %edge.to,
                "Ignoring invalid traffic multiplier"
            );
            1.0
        }
    }

    /// Estimate arrival at each bridge and at the end of `path`.
    ///
    /// The clock advances over every edge; a bridge is recorded at the moment
    /// the traveler reaches it.
    pub fn estimate(&self, path: &RoutePath, departure: NaiveDateTime) -> PathEta {
        let mut acc = Accumulator::default();
        let mut bridges = Vec::with_capacity(path.bridge_count());

        for (position, edge) in path.edges().iter().enumerate() {
            if let Some(bridge_id) = edge.crossed_bridge() {
                bridges.push(BridgeEta {
                    bridge_id: bridge_id.clone(),
                    edge_position: position,
                    eta: acc.summary(departure),
                });
            }

            let entered_at = acc.summary(departure).mean_time();
            let mean = edge.travel_time * self.multiplier(entered_at, edge);
            let sd = self.config.travel_time_cv * mean;

            acc.mean += mean;
            acc.variance += sd * sd;
            acc.min += mean * self.config.min_factor;
            acc.max += mean * self.config.max_factor;
        }

        PathEta {
            departure,
            arrival: acc.summary(departure),
            bridges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SegmentType;
    use crate::eta::TrafficConfig;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        // Monday
        NaiveDate::from_ymd_opt(2025, 1, 27)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn path() -> RoutePath {
        RoutePath::from_edges(
            vec![
                Edge::road("A", "B", 100.0, 0.0),
                Edge::bridge("B", "C", 60.0, 0.0, "1"),
                Edge::road("C", "D", 40.0, 0.0),
                Edge::bridge("D", "E", 30.0, 0.0, "2"),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn bridges_recorded_on_arrival() {
        let estimator = EtaEstimator::new(EtaConfig::default());
        let eta = estimator.estimate(&path(), at(12, 0));

        assert_eq!(eta.bridges.len(), 2);
        assert_eq!(eta.bridges[0].bridge_id, BridgeId::new("1"));
        assert_eq!(eta.bridges[0].edge_position, 1);
        assert_eq!(eta.bridges[0].eta.mean_secs, 100.0);
        assert_eq!(eta.bridges[1].eta.mean_secs, 200.0);
        assert_eq!(eta.arrival.mean_secs, 230.0);
    }

    #[test]
    fn spread_accumulates_per_edge() {
        let estimator = EtaEstimator::new(EtaConfig::default());
        let eta = estimator.estimate(&path(), at(12, 0));

        let expected_var: f64 = [100.0f64, 60.0, 40.0, 30.0]
            .iter()
            .map(|t| (0.15 * t).powi(2))
            .sum();
        assert!((eta.arrival.variance - expected_var).abs() < 1e-9);
        assert!((eta.arrival.min_secs - 230.0 * 0.85).abs() < 1e-9);
        assert!((eta.arrival.max_secs - 230.0 * 1.6).abs() < 1e-9);
    }

    #[test]
    fn empty_path_arrives_at_departure() {
        let estimator = EtaEstimator::new(EtaConfig::default());
        let path = RoutePath::new(vec!["A".into()], vec![], false).unwrap();
        let eta = estimator.estimate(&path, at(12, 0));

        assert_eq!(eta.arrival.mean_time(), at(12, 0));
        assert_eq!(eta.arrival.variance, 0.0);
        assert!(eta.bridges.is_empty());
    }

    #[test]
    fn rush_hour_slows_roads() {
        let config = EtaConfig {
            traffic: TrafficConfig {
                enabled: true,
                rush_hour_road_multiplier: 2.0,
                rush_hour_bridge_multiplier: 1.0,
            },
            ..EtaConfig::default()
        };
        let estimator = EtaEstimator::from_config(&config);

        let peak = estimator.estimate(&path(), at(8, 0));
        let calm = estimator.estimate(&path(), at(12, 0));
        assert_eq!(calm.arrival.mean_secs, 230.0);
        assert_eq!(peak.arrival.mean_secs, 200.0 + 60.0 + 80.0 + 30.0);
    }

    struct Broken;

    impl TrafficProfileProvider for Broken {
        fn multiplier(&self, _: NaiveDateTime, _: SegmentType) -> f64 {
            f64::NAN
        }
    }

    #[test]
    fn invalid_multiplier_treated_as_one() {
        let estimator = EtaEstimator::new(EtaConfig::default()).with_traffic(Arc::new(Broken));
        let eta = estimator.estimate(&path(), at(8, 0));
        assert_eq!(eta.arrival.mean_secs, 230.0);
    }

    #[test]
    fn huge_travel_time_does_not_overflow_clock() {
        let config = EtaConfig {
            traffic: TrafficConfig {
                enabled: true,
                ..TrafficConfig::default()
            },
            ..EtaConfig::default()
        };
        let path = RoutePath::from_edges(
            vec![
                Edge::road("A", "B", 1e13, 0.0),
                Edge::bridge("B", "C", 60.0, 0.0, "1"),
            ],
            false,
        )
        .unwrap();

        let eta = EtaEstimator::from_config(&config).estimate(&path, at(12, 0));

        assert_eq!(eta.bridges.len(), 1);
        assert_eq!(eta.bridges[0].eta.mean_secs, 1e13);
        assert_eq!(eta.bridges[0].eta.mean_time(), NaiveDateTime::MAX);
        assert_eq!(eta.arrival.latest_time(), NaiveDateTime::MAX);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn edges_strategy() -> impl Strategy<Value = Vec<(f64, bool)>> {
            prop::collection::vec((0.0f64..5000.0, any::<bool>()), 0..15)
        }

        proptest! {
            #[test]
            fn min_le_mean_le_max(
                edges in edges_strategy(),
                cv in 0.0f64..1.0,
                min_factor in 0.01f64..=1.0,
                max_factor in 1.0f64..5.0,
            ) {
                let path_edges: Vec<Edge> = edges
                    .iter()
                    .enumerate()
                    .map(|(i, &(t, bridge))| {
                        let (from, to) = (format!("N{i}"), format!("N{}", i + 1));
                        if bridge {
                            Edge::bridge(from, to, t, 0.0, i.to_string())
                        } else {
                            Edge::road(from, to, t, 0.0)
                        }
                    })
                    .collect();
                let path = if path_edges.is_empty() {
                    RoutePath::new(vec!["N0".into()], vec![], false).unwrap()
                } else {
                    RoutePath::from_edges(path_edges, false).unwrap()
                };

                let config = EtaConfig { travel_time_cv: cv, min_factor, max_factor, ..EtaConfig::default() };
                let eta = EtaEstimator::new(config).estimate(&path, at(8, 0));

                let summaries = eta.bridges.iter().map(|b| &b.eta).chain(std::iter::once(&eta.arrival));
                for s in summaries {
                    prop_assert!(s.min_secs <= s.mean_secs);
                    prop_assert!(s.mean_secs <= s.max_secs);
                    prop_assert!(s.p90_secs <= s.p95_secs && s.p95_secs <= s.p99_secs);
                    prop_assert!(s.min_secs <= s.p90_secs && s.p99_secs <= s.max_secs);
                }
            }
        }
    }
}
