use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use patent_insights_core::{CacheBackend, CacheRegion, Clock, InsightsResult, SummaryResult};

pub const SUMMARY_CACHE_KEY: &str = "summary_data";
pub const SUMMARY_CACHE_REGION: &str = "summary_cache";

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// In-process cache backend. Stale entries are skipped on read and replaced
/// by the next write; nothing sweeps them in the background.
pub struct MemoryCacheBackend<V> {
    entries: RwLock<HashMap<(String, String), CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V> MemoryCacheBackend<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl<V> CacheBackend<V> for MemoryCacheBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, key: &str, region: &CacheRegion) -> Option<V> {
        let guard = self.entries.read().await;
        let entry = guard.get(&(region.name.clone(), key.to_string()))?;
        let age = self.clock.now().saturating_duration_since(entry.created_at);
        if age < region.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    async fn write(&self, key: &str, value: V, region: &CacheRegion) {
        let created_at = self.clock.now();
        let mut guard = self.entries.write().await;
        guard.insert(
            (region.name.clone(), key.to_string()),
            CacheEntry { value, created_at },
        );
    }
}

/// Read-through cache for the composite summary.
#[derive(Clone)]
pub struct SummaryCache {
    backend: Arc<dyn CacheBackend<SummaryResult>>,
    region: CacheRegion,
}

impl SummaryCache {
    pub fn new(backend: Arc<dyn CacheBackend<SummaryResult>>, ttl: Duration) -> Self {
        Self {
            backend,
            region: CacheRegion::new(SUMMARY_CACHE_REGION, ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.region.ttl
    }

    /// Return the cached summary while it is fresh, otherwise run `compute`
    /// once and cache its result. Errors are returned uncached.
    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> InsightsResult<SummaryResult>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = InsightsResult<SummaryResult>> + Send,
    {
        if let Some(hit) = self.backend.read(SUMMARY_CACHE_KEY, &self.region).await {
            debug!("insights: summary cache hit");
            return Ok(hit);
        }
        debug!("insights: summary cache miss, computing");
        let fresh = compute().await?;
        self.backend
            .write(SUMMARY_CACHE_KEY, fresh.clone(), &self.region)
            .await;
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patent_insights_core::{InsightsError, ManualClock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary_with_total(total: u64) -> SummaryResult {
        let mut result = SummaryResult::default();
        result.summary.total_patents = total;
        result
    }

    #[tokio::test]
    async fn entries_expire_at_ttl() {
        let clock = Arc::new(ManualClock::new());
        let backend = MemoryCacheBackend::<u32>::new(clock.clone());
        let region = CacheRegion::new("numbers", Duration::from_secs(10));
        backend.write("k", 7, &region).await;

        clock.advance(Duration::from_secs(9));
        assert_eq!(backend.read("k", &region).await, Some(7));
        clock.advance(Duration::from_secs(1));
        assert_eq!(backend.read("k", &region).await, None);
    }

    #[tokio::test]
    async fn regions_do_not_share_keys() {
        let backend = MemoryCacheBackend::<u32>::new(Arc::new(ManualClock::new()));
        let first = CacheRegion::new("first", Duration::from_secs(60));
        let second = CacheRegion::new("second", Duration::from_secs(60));
        backend.write("k", 1, &first).await;
        assert_eq!(backend.read("k", &second).await, None);
        backend.write("k", 2, &first).await;
        assert_eq!(backend.read("k", &first).await, Some(2));
    }

    #[tokio::test]
    async fn get_or_compute_reuses_fresh_value() {
        let clock = Arc::new(ManualClock::new());
        let cache = SummaryCache::new(
            Arc::new(MemoryCacheBackend::<SummaryResult>::new(clock.clone())),
            Duration::from_secs(600),
        );
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let compute = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(summary_with_total(n + 1))
        };

        let first = cache.get_or_compute(compute).await.expect("first");
        let second = cache.get_or_compute(compute).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(600));
        let third = cache.get_or_compute(compute).await.expect("third");
        assert_eq!(third.summary.total_patents, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = SummaryCache::new(
            Arc::new(MemoryCacheBackend::<SummaryResult>::new(Arc::new(
                ManualClock::new(),
            ))),
            Duration::from_secs(600),
        );
        let err = cache
            .get_or_compute(|| async { Err(InsightsError::storage("down")) })
            .await
            .expect_err("failure propagates");
        assert!(matches!(err, InsightsError::Storage { .. }));

        let value = cache
            .get_or_compute(|| async { Ok(summary_with_total(3)) })
            .await
            .expect("recovers");
        assert_eq!(value.summary.total_patents, 3);
    }
}
