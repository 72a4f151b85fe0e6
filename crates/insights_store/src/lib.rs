pub mod config;
pub mod datastore;
mod db;
pub mod migration;
mod stats;
pub mod store;

pub use patent_insights_core::*;
pub use config::{CacheConfig, DatabaseConfig, InsightsConfig, PoolConfig};
pub use datastore::{open_store, Datastore};
pub use store::{AggregateStrategy, PatentStore};
