//! Arrival-time estimation along a route.
//!
//! Each edge's travel time is treated as an independent random variable
//! with a coefficient of variation and hard lower and upper factors. Summing
//! along the route gives the distribution of the arrival time at every
//! bridge and at the destination.

mod config;
mod estimator;
mod summary;
mod traffic;

pub use config::{EtaConfig, TrafficConfig};
pub use estimator::{BridgeEta, EtaEstimator, PathEta};
pub use summary::EtaSummary;
pub use traffic::{RushHourProfile, TrafficProfileProvider};
