//! Caching layer for threat check verdicts.
//!
//! Provides a [`ThreatCache`] trait with three implementations:
//! - [`MemoryCache`] - In-process TTL map (default)
//! - [`RedisCache`] - Redis-backed cache shared across instances
//! - [`NullCache`] - No-op implementation for testing/disabled caching

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, ThreatCache};
