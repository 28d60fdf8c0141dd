//! API route configuration.
//!
//! Every write endpoint is throttled per client IP through
//! [`crate::api::middleware::rate_limit`].

use axum::{Router, routing::post};

use crate::api::handlers::{shorten_handler, threat_check_handler};
use crate::api::middleware::rate_limit::{self, SHORTEN, THREAT_CHECK};
use crate::state::AppState;

/// # Endpoints
///
/// - `POST /shorten`      - Create a short link for one URL
/// - `POST /threat-check` - Check up to 500 URLs against the threat API
pub fn api_routes(behind_proxy: bool) -> Router<AppState> {
    let shorten = rate_limit::apply(
        Router::new().route("/shorten", post(shorten_handler)),
        SHORTEN,
        behind_proxy,
    );

    let threat_check = rate_limit::apply(
        Router::new().route("/threat-check", post(threat_check_handler)),
        THREAT_CHECK,
        behind_proxy,
    );

    Router::new().merge(shorten).merge(threat_check)
}
