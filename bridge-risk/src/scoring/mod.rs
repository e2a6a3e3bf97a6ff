//! Path and journey scoring.
//!
//! Combines per-bridge predictions into a probability per candidate path
//! (log-domain product over clamped bridge probabilities) and a network
//! probability that at least one candidate is passable (union of
//! independent paths).

mod aggregate;
mod analysis;
mod config;
mod orchestrator;

#[cfg(test)]
mod orchestrator_tests;

pub use aggregate::{any_path_probability, clamp_probability, path_log_probability, score_path};
pub use analysis::{BridgeScore, JourneyAnalysis, PathScore};
pub use config::ScoringConfig;
pub use orchestrator::{AnalysisError, AnalyzerSources, JourneyAnalyzer, JourneyRequest};
