//! Threat intelligence integration.
//!
//! - [`SafeBrowsingClient`] - the production [`ThreatChecker`]
//! - [`CircuitBreaker`] and [`RateLimiter`] - upstream protection shared by all calls
//! - [`protocol`] - request/response wire types

mod checker;
mod circuit_breaker;
mod client;
mod error;
pub mod protocol;
mod rate_limiter;

#[cfg(test)]
pub use checker::MockThreatChecker;
pub use checker::ThreatChecker;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerInfo, CircuitState};
pub use client::{MAX_URLS_PER_REQUEST, SafeBrowsingClient, ThreatCheckConfig, sanitize_url};
pub use error::ThreatCheckError;
pub use rate_limiter::{RateLimitInfo, RateLimiter};
