//! No-op cache implementation for testing or disabled caching.

use super::service::{CacheResult, ThreatCache};
use crate::domain::entities::ThreatDetectionResult;
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Every lookup misses, so every URL goes to the upstream API.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (threat result caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreatCache for NullCache {
    async fn get(&self, _url: &str) -> CacheResult<Option<ThreatDetectionResult>> {
        Ok(None)
    }

    async fn set(&self, _url: &str, _result: &ThreatDetectionResult) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}
