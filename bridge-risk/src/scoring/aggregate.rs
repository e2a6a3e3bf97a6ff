//! Probability aggregation.
//!
//! Path probabilities are products of per-bridge probabilities, computed as
//! sums of logarithms so long routes with many bridges do not underflow.
//! Bridges are treated as independent, including a bridge shared by several
//! candidate paths.

use super::config::ScoringConfig;

/// Clamp a probability into the configured band.
///
/// NaN maps to the lower bound.
pub fn clamp_probability(p: f64, config: &ScoringConfig) -> f64 {
    if p.is_nan() {
        return config.min_probability;
    }
    p.clamp(config.min_probability, config.max_probability)
}

/// Log-probability that every bridge on a path is open.
///
/// Inputs must already be clamped. An empty slice gives `0.0` (probability 1).
pub fn path_log_probability(clamped: &[f64]) -> f64 {
    clamped.iter().map(|p| p.ln()).sum()
}

/// Probability that at least one path succeeds: `1 - Π(1 - p)`.
///
/// Computed as `1 - exp(Σ ln(1 - p))` with `ln_1p` for precision when
/// probabilities are small. No paths gives 0.
///
/// # Examples
///
/// ```
/// use bridge_risk::scoring::any_path_probability;
///
/// let p = any_path_probability(&[0.9, 0.8]);
/// assert!((p - 0.98).abs() < 1e-12);
/// assert_eq!(any_path_probability(&[]), 0.0);
/// ```
pub fn any_path_probability(path_probabilities: &[f64]) -> f64 {
    let log_all_fail: f64 = path_probabilities
        .iter()
        .map(|&p| (-p.clamp(0.0, 1.0)).ln_1p())
        .sum();
    (-log_all_fail.exp_m1()).clamp(0.0, 1.0)
}

/// Clamp raw bridge probabilities and combine them into
/// `(clamped, log_probability, probability)`.
pub fn score_path(raw: &[f64], config: &ScoringConfig) -> (Vec<f64>, f64, f64) {
    let clamped: Vec<f64> = raw.iter().map(|&p| clamp_probability(p, config)).collect();
    let log_probability = path_log_probability(&clamped);
    (clamped, log_probability, log_probability.exp())
}
