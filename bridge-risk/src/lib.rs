//! Bridge-crossing risk engine.
//!
//! Answers: "if I leave now, how likely is it that I can get across the
//! water by at least one of my candidate routes?" Candidate paths through a
//! road graph are enumerated, the time each bridge is reached is estimated,
//! a predictor gives the probability each bridge is open at that time, and
//! the results are combined per path and across paths.

pub mod config;
pub mod domain;
pub mod eta;
pub mod features;
pub mod history;
pub mod metrics;
pub mod planner;
pub mod predict;
pub mod scoring;
pub mod signals;
pub mod training;
pub mod web;
