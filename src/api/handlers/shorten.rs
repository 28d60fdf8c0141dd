//! Handler for link shortening endpoint.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::HeaderMap};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_origin::request_origin;

/// Creates a short link after validating and threat-checking the target.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "shortUrl": "http://localhost:3000/aZ3kP9",
///   "shortCode": "aZ3kP9"
/// }
/// ```
///
/// # Errors
///
/// - 400 for malformed, insecure or flagged URLs (flagged URLs list their threats)
/// - 429 / 503 when the threat API budget is spent or its breaker is open
/// - 502 when the threat API fails
/// - 500 when no unique code could be stored
pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let origin = request_origin(&headers, state.base_url.scheme(), state.behind_proxy);

    let created = state
        .link_service
        .create_short_link(&payload.url, origin)
        .await?;

    Ok(Json(ShortenResponse {
        success: true,
        short_url: created.short_url,
        short_code: created.link.short_code,
    }))
}
