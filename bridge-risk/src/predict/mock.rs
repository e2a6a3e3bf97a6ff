//! Seeded mock predictor for development and tests.
//!
//! Serves reproducible pseudo-random probabilities without any model or
//! history. Each crossing gets its own `ChaCha8Rng` stream derived from the
//! seed, the bridge and the ETA's 5-minute bucket, so the value for a
//! crossing does not depend on where it sits in the batch.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::BridgeId;
use crate::domain::time::absolute_bucket;

use super::{BridgeOpeningPredictor, BridgePrediction, PredictionError, PredictionRequest};

const MIN_PROBABILITY: f64 = 0.05;
const MAX_PROBABILITY: f64 = 0.95;
const CONFIDENCE: f64 = 0.5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a, stable across platforms and releases.
fn fnv1a(bytes: &[u8], mut hash: u64) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn crossing_hash(bridge: &BridgeId, bucket: i64) -> u64 {
    let hash = fnv1a(bridge.as_str().as_bytes(), FNV_OFFSET);
    // Separator keeps ("1", 23) and ("12", 3) apart
    let hash = fnv1a(&[0xff], hash);
    fnv1a(&bucket.to_le_bytes(), hash)
}

/// Deterministic pseudo-random predictor.
#[derive(Debug, Clone)]
pub struct SeededMockPredictor {
    seed: u64,
}

impl SeededMockPredictor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn probability(&self, bridge: &BridgeId, bucket: i64) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ crossing_hash(bridge, bucket));
        rng.gen_range(MIN_PROBABILITY..MAX_PROBABILITY)
    }
}

impl BridgeOpeningPredictor for SeededMockPredictor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn predict_batch(
        &self,
        batch: &[PredictionRequest],
    ) -> Result<Vec<BridgePrediction>, PredictionError> {
        Ok(batch
            .iter()
            .map(|req| BridgePrediction {
                bridge_id: req.bridge_id.clone(),
                probability: self.probability(&req.bridge_id, absolute_bucket(req.eta)),
                confidence: CONFIDENCE,
            })
            .collect())
    }
}
