//! Cache for key-pure bucket features.
//!
//! Keys are `(bridge, absolute 5-minute bucket)`. Different candidate paths
//! that reach the same bridge in the same bucket share one entry, so the
//! history and signal lookups run once per key. Values are pure functions of
//! the key, so a racing second writer stores the same value.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::config::PerformanceConfig;
use crate::domain::BridgeId;

use super::builder::{BucketFeatures, FeatureBuilder};

/// Cache key: (bridge, absolute 5-minute bucket index).
type FeatureKey = (BridgeId, i64);

/// Bounded, concurrent feature cache.
#[derive(Clone)]
pub struct FeatureCache {
    entries: MokaCache<FeatureKey, Arc<BucketFeatures>>,
}

impl FeatureCache {
    /// Create a cache sized by the performance config.
    pub fn new(config: &PerformanceConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(Duration::from_secs(config.feature_cache_ttl_secs))
            .max_capacity(config.feature_cache_capacity)
            .build();

        Self { entries }
    }

    /// Fetch the features for a key, building them on a miss.
    ///
    /// Returns the features and whether they came from the cache.
    pub async fn get_or_build(
        &self,
        bridge: &BridgeId,
        bucket: i64,
        builder: &FeatureBuilder,
    ) -> (Arc<BucketFeatures>, bool) {
        let entry = self
            .entries
            .entry((bridge.clone(), bucket))
            .or_insert_with(async { Arc::new(builder.bucket_features(bridge, bucket)) })
            .await;

        let hit = !entry.is_fresh();
        (entry.into_value(), hit)
    }

    /// Get a cached entry without building.
    pub async fn get(&self, bridge: &BridgeId, bucket: i64) -> Option<Arc<BucketFeatures>> {
        self.entries.get(&(bridge.clone(), bucket)).await
    }

    /// Approximate number of entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Apply pending evictions; entry counts are eventually consistent otherwise.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::BridgeCatalog;

    fn config(capacity: u64) -> PerformanceConfig {
        PerformanceConfig {
            feature_cache_capacity: capacity,
            ..PerformanceConfig::default()
        }
    }

    #[tokio::test]
    async fn second_lookup_hits() {
        let cache = FeatureCache::new(&config(100));
        let builder = FeatureBuilder::new(BridgeCatalog::default());
        let bridge = BridgeId::new("1");

        let (first, hit) = cache.get_or_build(&bridge, 42, &builder).await;
        assert!(!hit);
        let (second, hit) = cache.get_or_build(&bridge, 42, &builder).await;
        assert!(hit);
        assert_eq!(first, second);

        let (_, hit) = cache.get_or_build(&bridge, 43, &builder).await;
        assert!(!hit);
        assert!(cache.get(&BridgeId::new("2"), 42).await.is_none());
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = FeatureCache::new(&config(16));
        let builder = FeatureBuilder::new(BridgeCatalog::default());

        for bucket in 0..500 {
            cache
                .get_or_build(&BridgeId::new("1"), bucket, &builder)
                .await;
        }
        cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 16);
    }

    #[tokio::test]
    async fn invalidate_clears() {
        let cache = FeatureCache::new(&config(100));
        let builder = FeatureBuilder::new(BridgeCatalog::default());
        cache.get_or_build(&BridgeId::new("1"), 1, &builder).await;

        cache.invalidate_all();
        assert!(cache.get(&BridgeId::new("1"), 1).await.is_none());
    }
}
