//! Redis-backed threat cache implementation.

use super::service::{CacheError, CacheResult, ThreatCache};
use crate::domain::entities::ThreatDetectionResult;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache shared by every instance of the service.
///
/// Verdicts are stored as JSON under `threat:{url}` with `SETEX`.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    ttl_seconds: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            ttl_seconds,
            key_prefix: "threat:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, url: &str) -> String {
        format!("{}{}", self.key_prefix, url)
    }
}

#[async_trait]
impl ThreatCache for RedisCache {
    async fn get(&self, url: &str) -> CacheResult<Option<ThreatDetectionResult>> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(result) => {
                    debug!("Threat cache HIT: {}", url);
                    Ok(Some(result))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", url, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Threat cache MISS: {}", url);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", url, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, url: &str, result: &ThreatDetectionResult) -> CacheResult<()> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();

        let payload = serde_json::to_string(result)
            .map_err(|e| CacheError::OperationError(e.to_string()))?;

        if let Err(e) = conn
            .set_ex::<_, _, ()>(&key, payload, self.ttl_seconds)
            .await
        {
            warn!("Redis SET error for {}: {}", url, e);
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
