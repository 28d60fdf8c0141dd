//! Handler for the batch threat check endpoint.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;

use crate::api::dto::threat_check::{ThreatCheckMetadata, ThreatCheckRequest, ThreatCheckResponse};
use crate::error::AppError;
use crate::infrastructure::threat_check::ThreatCheckError;
use crate::state::AppState;

/// Checks up to 500 URLs against the threat intelligence API.
///
/// # Endpoint
///
/// `POST /threat-check`
///
/// # Request Body
///
/// ```json
/// { "urls": ["https://example.com", "http://malware.test"], "clientId": "scanner" }
/// ```
///
/// `urls` may also be a single string. Results come back in request order,
/// with rate limit and circuit breaker snapshots in `metadata`.
///
/// # Errors
///
/// The machine-readable reason is in `error.details.reason`:
///
/// - 400 `NO_URLS_PROVIDED`, `TOO_MANY_URLS`, `INVALID_URL`, `INVALID_URL_FORMAT`
/// - 500 `MISSING_API_KEY`
/// - 429 `RATE_LIMIT_EXCEEDED`, 503 `CIRCUIT_BREAKER_OPEN`
/// - 502 `API_ERROR`, `TIMEOUT`, `NETWORK_ERROR`, `INVALID_RESPONSE`
pub async fn threat_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<ThreatCheckRequest>, JsonRejection>,
) -> Result<Json<ThreatCheckResponse>, AppError> {
    let Json(payload) = payload?;
    let urls = payload
        .urls
        .ok_or(ThreatCheckError::NoUrlsProvided)?
        .into_vec();

    let results = state.threat_checker.check_urls(&urls).await?;

    let unsafe_urls = results.iter().filter(|r| !r.is_safe).count();
    let metadata = ThreatCheckMetadata {
        total_urls: results.len(),
        safe_urls: results.len() - unsafe_urls,
        unsafe_urls,
        checked_at: Utc::now(),
        client_id: payload.client_id,
        rate_limit: state.threat_checker.rate_limit_info(),
        circuit_breaker: state.threat_checker.circuit_breaker_info(),
    };

    Ok(Json(ThreatCheckResponse {
        success: true,
        results,
        metadata,
    }))
}
