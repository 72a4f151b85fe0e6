use std::time::Duration;

use async_trait::async_trait;

use crate::{CorrelationResult, InsightsResult, PatentQuery, PatentRecord, SummaryResult};

#[async_trait]
pub trait SummaryStatsApi {
    /// Run the statistics, year histogram and top-assignee reads and merge them.
    async fn compute_summary(&self) -> InsightsResult<SummaryResult>;
}

#[async_trait]
pub trait CorrelationApi {
    async fn compute_correlation(&self) -> InsightsResult<CorrelationResult>;
}

#[async_trait]
pub trait PatentLookupApi {
    async fn find_patents(&self, query: &PatentQuery) -> InsightsResult<Vec<PatentRecord>>;
}

pub trait PatentAnalytics:
    SummaryStatsApi + CorrelationApi + PatentLookupApi + Send + Sync
{
}

impl<T> PatentAnalytics for T where
    T: SummaryStatsApi + CorrelationApi + PatentLookupApi + Send + Sync
{
}

/// Named cache area; every entry written into a region shares its TTL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheRegion {
    pub name: String,
    pub ttl: Duration,
}

impl CacheRegion {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
        }
    }
}

/// Key/value store with read-time expiry.
///
/// `read` returns `None` for a missing or stale entry; `write` replaces any
/// existing entry for the key.
#[async_trait]
pub trait CacheBackend<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, key: &str, region: &CacheRegion) -> Option<V>;
    async fn write(&self, key: &str, value: V, region: &CacheRegion);
}
