//! Threat check error type.

use std::time::Duration;

use serde_json::json;

use crate::error::AppError;

/// Every way a threat check can fail.
///
/// Each variant has a stable machine-readable [`code`](ThreatCheckError::code)
/// that the HTTP layer uses to pick a status code.
#[derive(Debug, thiserror::Error)]
pub enum ThreatCheckError {
    #[error("No URLs provided")]
    NoUrlsProvided,

    #[error("Too many URLs: {count} provided, at most {max} allowed")]
    TooManyUrls { count: usize, max: usize },

    #[error("URL at position {index} is empty")]
    InvalidUrl { index: usize },

    #[error("Invalid URL format '{url}': {reason}")]
    InvalidUrlFormat { url: String, reason: String },

    #[error("Threat check API key is not configured")]
    MissingApiKey,

    #[error("Threat check temporarily disabled after repeated upstream failures")]
    CircuitBreakerOpen { retry_after: Duration },

    #[error("Threat check rate limit exceeded")]
    RateLimitExceeded { retry_after: Duration },

    #[error("Threat check API returned HTTP {status}")]
    ApiError { status: u16, body: String },

    #[error("Threat check API did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Threat check API request failed: {0}")]
    Network(String),

    #[error("Threat check API returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl ThreatCheckError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoUrlsProvided => "NO_URLS_PROVIDED",
            Self::TooManyUrls { .. } => "TOO_MANY_URLS",
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::InvalidUrlFormat { .. } => "INVALID_URL_FORMAT",
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::CircuitBreakerOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::ApiError { .. } => "API_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Network(_) => "NETWORK_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }

    /// True for failures of the upstream call itself.
    ///
    /// These are the failures the circuit breaker counts.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::ApiError { .. } | Self::Timeout(_) | Self::Network(_) | Self::InvalidResponse(_)
        )
    }

    /// Suggested wait before retrying, for throttling errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::CircuitBreakerOpen { retry_after } | Self::RateLimitExceeded { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}

impl From<ThreatCheckError> for AppError {
    fn from(e: ThreatCheckError) -> Self {
        let mut details = json!({ "reason": e.code() });
        if let Some(wait) = e.retry_after() {
            details["retry_after_secs"] = json!(wait.as_secs_f64().ceil() as u64);
        }
        if let ThreatCheckError::ApiError { status, .. } = &e {
            details["upstream_status"] = json!(status);
        }

        let message = e.to_string();
        match e {
            ThreatCheckError::NoUrlsProvided
            | ThreatCheckError::TooManyUrls { .. }
            | ThreatCheckError::InvalidUrl { .. }
            | ThreatCheckError::InvalidUrlFormat { .. } => AppError::bad_request(message, details),
            ThreatCheckError::MissingApiKey => AppError::internal(message, details),
            ThreatCheckError::RateLimitExceeded { .. } => {
                AppError::too_many_requests(message, details)
            }
            ThreatCheckError::CircuitBreakerOpen { .. } => {
                AppError::service_unavailable(message, details)
            }
            ThreatCheckError::ApiError { .. }
            | ThreatCheckError::Timeout(_)
            | ThreatCheckError::Network(_)
            | ThreatCheckError::InvalidResponse(_) => AppError::bad_gateway(message, details),
        }
    }
}
