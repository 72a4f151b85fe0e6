//! Process bootstrap: one store connection, one summary cache, one facade.

use std::path::Path;
use std::sync::Arc;

use log::info;

use patent_insights_core::{InsightsResult, SummaryResult, SystemClock};
use patent_insights_store::{open_store, Datastore, PatentStore};

use crate::cache::{MemoryCacheBackend, SummaryCache};
use crate::service::QueryService;

pub struct InsightsState {
    store: PatentStore,
    service: QueryService,
}

impl InsightsState {
    /// Load (or create) `insights.json` under `base_dir`, connect the store
    /// and wire the facade with an in-memory summary cache.
    pub async fn open(base_dir: &Path) -> InsightsResult<Self> {
        let Datastore { config, store } = open_store(base_dir).await?;
        let backend = MemoryCacheBackend::<SummaryResult>::new(Arc::new(SystemClock));
        let cache = SummaryCache::new(Arc::new(backend), config.summary_ttl());
        info!(
            "insights: state ready backend={} summary_ttl={:?}",
            config.backend_name(),
            cache.ttl()
        );
        let service = QueryService::new(Arc::new(store.clone()), cache);
        Ok(Self { store, service })
    }

    pub fn service(&self) -> &QueryService {
        &self.service
    }

    pub fn store(&self) -> &PatentStore {
        &self.store
    }
}
