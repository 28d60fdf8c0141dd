//! In-process TTL cache backed by moka.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::trace;

use super::service::{CacheResult, ThreatCache};
use crate::domain::entities::ThreatDetectionResult;

/// Upper bound on cached verdicts held in memory.
const MAX_CAPACITY: u64 = 100_000;

/// Per-process threat verdict cache.
///
/// Entries expire `ttl` after insertion; least recently used entries are
/// evicted once [`MAX_CAPACITY`] is reached.
pub struct MemoryCache {
    inner: Cache<String, ThreatDetectionResult>,
}

impl MemoryCache {
    /// Creates a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(MAX_CAPACITY)
            .build();

        Self { inner }
    }
}

#[async_trait]
impl ThreatCache for MemoryCache {
    async fn get(&self, url: &str) -> CacheResult<Option<ThreatDetectionResult>> {
        let hit = self.inner.get(url).await;
        trace!("Threat cache {}: {}", if hit.is_some() { "HIT" } else { "MISS" }, url);
        Ok(hit)
    }

    async fn set(&self, url: &str, result: &ThreatDetectionResult) -> CacheResult<()> {
        self.inner.insert(url.to_string(), result.clone()).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
