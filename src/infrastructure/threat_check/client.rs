//! Google Safe Browsing v4 client.
//!
//! A call runs through these gates in order: input validation, cache lookup,
//! API key, circuit breaker, request budget. Only cache misses reach the
//! network, and a batch answered entirely from cache costs no budget.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use super::checker::ThreatChecker;
use super::circuit_breaker::{
    CircuitBreaker, CircuitBreakerInfo, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT,
};
use super::error::ThreatCheckError;
use super::protocol::{FindThreatMatchesRequest, FindThreatMatchesResponse, verdict_for};
use super::rate_limiter::{DEFAULT_LIMIT, DEFAULT_WINDOW, RateLimitInfo, RateLimiter};
use crate::domain::entities::ThreatDetectionResult;
use crate::infrastructure::cache::ThreatCache;

/// Largest batch accepted by a single check.
pub const MAX_URLS_PER_REQUEST: usize = 500;

pub const DEFAULT_API_URL: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";
pub const DEFAULT_CLIENT_ID: &str = "safe-shortener";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

static SCHEME_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid scheme prefix regex")
});

#[derive(Debug, Clone)]
pub struct ThreatCheckConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub client_id: String,
    pub client_version: String,
    pub timeout: Duration,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
}

impl Default for ThreatCheckConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: DEFAULT_LIMIT,
            rate_window: DEFAULT_WINDOW,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

/// Threat checker backed by the Safe Browsing Lookup API.
///
/// One instance should be shared process-wide so that the breaker and the
/// request budget see every call.
pub struct SafeBrowsingClient {
    http: reqwest::Client,
    config: ThreatCheckConfig,
    circuit_breaker: Mutex<CircuitBreaker>,
    rate_limiter: Mutex<RateLimiter>,
    cache: Arc<dyn ThreatCache>,
}

impl SafeBrowsingClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ThreatCheckConfig, cache: Arc<dyn ThreatCache>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            circuit_breaker: Mutex::new(CircuitBreaker::new(
                config.failure_threshold,
                config.reset_timeout,
            )),
            rate_limiter: Mutex::new(RateLimiter::new(
                config.rate_limit,
                config.rate_window,
                Instant::now(),
            )),
            config,
            cache,
        })
    }

    fn breaker(&self) -> std::sync::MutexGuard<'_, CircuitBreaker> {
        self.circuit_breaker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn limiter(&self) -> std::sync::MutexGuard<'_, RateLimiter> {
        self.rate_limiter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serves what it can from cache; returns the hits and the deduplicated misses.
    async fn lookup_cached(
        &self,
        urls: &[String],
    ) -> (HashMap<String, ThreatDetectionResult>, Vec<String>) {
        let now = Utc::now();
        let mut hits = HashMap::new();
        let mut seen = HashSet::new();
        let mut misses = Vec::new();

        for url in urls {
            if !seen.insert(url.as_str()) {
                continue;
            }

            match self.cache.get(url).await {
                Ok(Some(cached)) if cached.cache_expires_at.is_none_or(|at| at > now) => {
                    hits.insert(url.clone(), cached);
                }
                Ok(_) => misses.push(url.clone()),
                Err(e) => {
                    warn!("Threat cache lookup failed for {}: {}", url, e);
                    misses.push(url.clone());
                }
            }
        }

        (hits, misses)
    }

    /// Admits one upstream call through the breaker and the request budget.
    ///
    /// The breaker only moves to HALF_OPEN once the budget has admitted the
    /// call, so a refused call never counts as a trial request. Lock order is
    /// breaker, then limiter.
    fn admit(&self) -> Result<(), ThreatCheckError> {
        let now = Instant::now();
        let mut breaker = self.breaker();

        breaker
            .check(now)
            .map_err(|retry_after| ThreatCheckError::CircuitBreakerOpen { retry_after })?;

        self.limiter()
            .try_acquire(now)
            .map_err(|retry_after| ThreatCheckError::RateLimitExceeded { retry_after })?;

        breaker
            .try_acquire(now)
            .map_err(|retry_after| ThreatCheckError::CircuitBreakerOpen { retry_after })
    }

    async fn query_upstream(
        &self,
        api_key: &str,
        urls: &[String],
    ) -> Result<FindThreatMatchesResponse, ThreatCheckError> {
        let body = FindThreatMatchesRequest::new(
            &self.config.client_id,
            &self.config.client_version,
            urls,
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ThreatCheckError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| self.transport_error(e))?;
        if raw.trim().is_empty() {
            return Ok(FindThreatMatchesResponse::default());
        }

        serde_json::from_str(&raw).map_err(|e| ThreatCheckError::InvalidResponse(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ThreatCheckError {
        if e.is_timeout() {
            ThreatCheckError::Timeout(self.config.timeout)
        } else {
            ThreatCheckError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ThreatChecker for SafeBrowsingClient {
    async fn check_urls(
        &self,
        urls: &[String],
    ) -> Result<Vec<ThreatDetectionResult>, ThreatCheckError> {
        let sanitized = sanitize_batch(urls)?;
        let (mut verdicts, misses) = self.lookup_cached(&sanitized).await;

        if !misses.is_empty() {
            let api_key = self
                .config
                .api_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .ok_or(ThreatCheckError::MissingApiKey)?;

            self.admit()?;
            metrics::counter!("threat_checks_total").increment(1);
            debug!("Querying threat API for {} URLs", misses.len());

            let response = match self.query_upstream(api_key, &misses).await {
                Ok(response) => {
                    self.breaker().record_success();
                    response
                }
                Err(e) => {
                    metrics::counter!("threat_check_failures_total").increment(1);
                    warn!("Threat check failed ({}): {}", e.code(), e);
                    if e.is_upstream() {
                        self.breaker().record_failure(Instant::now());
                    }
                    return Err(e);
                }
            };

            let checked_at = Utc::now();
            for url in misses {
                let verdict = verdict_for(&url, &response.matches, checked_at);
                if !verdict.is_safe {
                    warn!("Threat detected for {}: {} match(es)", url, verdict.threats.len());
                }
                if let Err(e) = self.cache.set(&url, &verdict).await {
                    warn!("Failed to cache threat verdict for {}: {}", url, e);
                }
                verdicts.insert(url, verdict);
            }
        }

        sanitized
            .iter()
            .map(|url| {
                verdicts.get(url).cloned().ok_or_else(|| {
                    ThreatCheckError::InvalidResponse(format!("no verdict for {url}"))
                })
            })
            .collect()
    }

    fn circuit_breaker_info(&self) -> CircuitBreakerInfo {
        self.breaker().info(Instant::now())
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        self.limiter().info(Instant::now())
    }
}

/// Validates batch size and sanitizes every entry.
fn sanitize_batch(urls: &[String]) -> Result<Vec<String>, ThreatCheckError> {
    if urls.is_empty() {
        return Err(ThreatCheckError::NoUrlsProvided);
    }
    if urls.len() > MAX_URLS_PER_REQUEST {
        return Err(ThreatCheckError::TooManyUrls {
            count: urls.len(),
            max: MAX_URLS_PER_REQUEST,
        });
    }

    urls.iter()
        .enumerate()
        .map(|(index, raw)| sanitize_url(index, raw))
        .collect()
}

/// Trims the input and prefixes `http://` when it carries no scheme.
///
/// The result is sent upstream exactly as returned; parsing only decides
/// whether the input is acceptable.
pub fn sanitize_url(index: usize, raw: &str) -> Result<String, ThreatCheckError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ThreatCheckError::InvalidUrl { index });
    }

    let candidate = if SCHEME_PREFIX_REGEX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    Url::parse(&candidate).map_err(|e| ThreatCheckError::InvalidUrlFormat {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    Ok(candidate)
}
