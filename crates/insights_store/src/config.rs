use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use patent_insights_core::{InsightsError, InsightsResult};

const DEFAULT_CONFIG_NAME: &str = "insights.json";
const DEFAULT_SUMMARY_TTL_SECS: u64 = 600;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    pub summary_ttl_secs: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightsConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub cache: Option<CacheConfig>,
    /// Create the `patents` table when it is missing. Defaults to on for
    /// SQLite and off for server backends, whose schema is owned elsewhere.
    #[serde(default)]
    pub manage_schema: Option<bool>,
}

impl InsightsConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            cache: Some(CacheConfig {
                summary_ttl_secs: Some(DEFAULT_SUMMARY_TTL_SECS),
            }),
            manage_schema: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> InsightsResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| InsightsError::config(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| InsightsError::config(format!("read config: {err}")))?;
            let config: InsightsConfig = serde_json::from_str(&raw)
                .map_err(|err| InsightsError::config(format!("parse config: {err}")))?;
            return Ok(config);
        }
        let default = InsightsConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| InsightsError::config(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| InsightsError::config(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> InsightsResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "patents.sqlite".to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(InsightsError::config("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn connection_url(&self, base_dir: &Path) -> InsightsResult<String> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => {
                let path = self.sqlite_path(base_dir)?;
                Ok(format!("sqlite://{}?mode=rwc", path.display()))
            }
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Ok(url.clone()),
        }
    }

    pub fn summary_ttl(&self) -> Duration {
        let secs = self
            .cache
            .as_ref()
            .and_then(|cache| cache.summary_ttl_secs)
            .unwrap_or(DEFAULT_SUMMARY_TTL_SECS);
        Duration::from_secs(secs)
    }

    pub fn manages_schema(&self) -> bool {
        self.manage_schema
            .unwrap_or(matches!(self.database, DatabaseConfig::Sqlite { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_or_init_writes_default_and_reads_it_back() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let default_path = base.join("patents.sqlite");
        let created = InsightsConfig::load_or_init(base, &default_path).expect("init");
        assert!(base.join(DEFAULT_CONFIG_NAME).exists());
        assert_eq!(created.backend_name(), "sqlite");

        let loaded = InsightsConfig::load_or_init(base, &default_path).expect("load");
        assert_eq!(
            loaded.sqlite_path(base).expect("path"),
            created.sqlite_path(base).expect("path")
        );
        assert_eq!(loaded.summary_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn rejects_malformed_config_file() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        fs::write(base.join(DEFAULT_CONFIG_NAME), "{ not json").expect("write");
        let err = InsightsConfig::load_or_init(base, &base.join("patents.sqlite"))
            .expect_err("malformed config");
        assert!(matches!(err, InsightsError::Config { .. }));
    }

    #[test]
    fn relative_sqlite_path_resolves_against_base_dir() {
        let config = InsightsConfig::default_sqlite("data/patents.sqlite");
        let base = Path::new("/srv/insights");
        assert_eq!(
            config.sqlite_path(base).expect("path"),
            PathBuf::from("/srv/insights/data/patents.sqlite")
        );
        assert_eq!(
            config.connection_url(base).expect("url"),
            "sqlite:///srv/insights/data/patents.sqlite?mode=rwc"
        );
    }

    #[test]
    fn schema_management_defaults_by_backend() {
        let sqlite = InsightsConfig::default_sqlite("patents.sqlite");
        assert!(sqlite.manages_schema());

        let postgres = InsightsConfig {
            database: DatabaseConfig::Postgres {
                url: "postgres://reader@localhost/patents".to_string(),
            },
            pool: None,
            cache: None,
            manage_schema: None,
        };
        assert!(!postgres.manages_schema());
        assert_eq!(postgres.summary_ttl(), Duration::from_secs(600));
        assert!(postgres.sqlite_path(Path::new("/tmp")).is_err());
    }
}
