//! Threat cache trait and error types.

use async_trait::async_trait;
use std::fmt;

use crate::domain::entities::ThreatDetectionResult;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Expiring store of threat check verdicts keyed by sanitized URL.
///
/// Implementations are fail-open: a broken cache degrades to upstream calls
/// and must never fail a threat check.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process TTL map (default)
/// - [`crate::infrastructure::cache::RedisCache`] - shared Redis cache with TTL
/// - [`crate::infrastructure::cache::NullCache`] - no-op, caching disabled
#[async_trait]
pub trait ThreatCache: Send + Sync {
    /// Returns the cached verdict for `url`, if any and not expired.
    async fn get(&self, url: &str) -> CacheResult<Option<ThreatDetectionResult>>;

    /// Stores a verdict for `url` with the cache's TTL.
    async fn set(&self, url: &str, result: &ThreatDetectionResult) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name used in logs and health output.
    fn backend(&self) -> &'static str;
}
