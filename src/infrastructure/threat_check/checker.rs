use async_trait::async_trait;

use super::circuit_breaker::CircuitBreakerInfo;
use super::error::ThreatCheckError;
use super::rate_limiter::RateLimitInfo;
use crate::domain::entities::ThreatDetectionResult;

/// Screens URLs against a threat intelligence source.
///
/// Results come back in input order, one per submitted URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThreatChecker: Send + Sync {
    async fn check_urls(
        &self,
        urls: &[String],
    ) -> Result<Vec<ThreatDetectionResult>, ThreatCheckError>;

    /// Checks a single URL.
    async fn check_url(&self, url: &str) -> Result<ThreatDetectionResult, ThreatCheckError> {
        self.check_urls(&[url.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ThreatCheckError::InvalidResponse("empty result set".to_string()))
    }

    fn circuit_breaker_info(&self) -> CircuitBreakerInfo;

    fn rate_limit_info(&self) -> RateLimitInfo;
}
