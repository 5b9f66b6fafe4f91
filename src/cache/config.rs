//! Cache configuration.
//!
//! Controls the in-memory snapshot cache and the durable snapshot file via
//! `bazari.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_MEMORY_TTL_SECONDS: u64 = 120;
const DEFAULT_FILE_TTL_SECONDS: u64 = 300;
const DEFAULT_SNAPSHOT_PATH: &str = "data/ads-snapshot.json";
const DEFAULT_AUTO_CONSUME_INTERVAL_MS: u64 = 1000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 64;
const DEFAULT_STORE_QUERY_TIMEOUT_MS: u64 = 3000;

/// Cache configuration from `bazari.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the snapshot cache tiers. Disabling routes every public read
    /// straight to the store (intended for tests and debugging only).
    pub enabled: bool,
    /// Freshness window of the in-memory snapshot, in seconds.
    pub memory_ttl_seconds: u64,
    /// Freshness window of the durable snapshot file at startup, in seconds.
    pub file_ttl_seconds: u64,
    /// Location of the durable snapshot file.
    pub snapshot_path: PathBuf,
    /// Auto-consume interval (ms) for eventual consistency.
    pub auto_consume_interval_ms: u64,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
    /// Bounded timeout for store queries on the public read path, in ms.
    pub store_query_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            memory_ttl_seconds: DEFAULT_MEMORY_TTL_SECONDS,
            file_ttl_seconds: DEFAULT_FILE_TTL_SECONDS,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            auto_consume_interval_ms: DEFAULT_AUTO_CONSUME_INTERVAL_MS,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
            store_query_timeout_ms: DEFAULT_STORE_QUERY_TIMEOUT_MS,
        }
    }
}

impl CacheConfig {
    pub fn memory_ttl(&self) -> Duration {
        Duration::from_secs(self.memory_ttl_seconds)
    }

    pub fn file_ttl(&self) -> Duration {
        Duration::from_secs(self.file_ttl_seconds)
    }

    pub fn store_query_timeout(&self) -> Duration {
        Duration::from_millis(self.store_query_timeout_ms)
    }
}
