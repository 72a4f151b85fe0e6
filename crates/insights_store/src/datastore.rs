use std::path::Path;

use log::info;

use crate::{InsightsConfig, InsightsResult, PatentStore};

const DEFAULT_DB_NAME: &str = "patents.sqlite";

/// A connected store together with the configuration it was opened from.
pub struct Datastore {
    pub config: InsightsConfig,
    pub store: PatentStore,
}

/// Read `insights.json` under `base` (writing a SQLite default on first use)
/// and connect to the configured backend.
pub async fn open_store(base: &Path) -> InsightsResult<Datastore> {
    let config = InsightsConfig::load_or_init(base, &base.join(DEFAULT_DB_NAME))?;
    let store = PatentStore::connect(&config, base).await?;
    info!("insights: datastore opened at {}", base.display());
    Ok(Datastore { config, store })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patent_insights_core::SummaryStatsApi;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn first_open_writes_sqlite_defaults_and_creates_schema() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let opened = open_store(base).await.expect("open store");

        let raw = std::fs::read_to_string(base.join("insights.json")).expect("config file");
        let written: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(written["database"]["backend"], "sqlite");
        assert_eq!(written["cache"]["summary_ttl_secs"], 600);
        assert_eq!(opened.config.summary_ttl(), Duration::from_secs(600));
        assert!(opened.config.manages_schema());
        assert!(base.join(DEFAULT_DB_NAME).exists());

        let summary = opened.store.compute_summary().await.expect("summary");
        assert_eq!(summary.summary.total_patents, 0);
    }

    #[tokio::test]
    async fn reopening_keeps_edited_config() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        open_store(base).await.expect("first open");
        std::fs::write(
            base.join("insights.json"),
            r#"{"database":{"backend":"sqlite","path":"other.sqlite"},"cache":{"summary_ttl_secs":5}}"#,
        )
        .expect("edit config");

        let opened = open_store(base).await.expect("reopen");
        assert_eq!(opened.config.summary_ttl(), Duration::from_secs(5));
        assert!(base.join("other.sqlite").exists());
    }
}
