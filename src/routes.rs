//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET  /{code}`        - Short link redirect
//! - `GET  /health`        - Health check: database, click queue, threat cache, breaker
//! - `POST /shorten`       - Create a short link (throttled)
//! - `POST /threat-check`  - Batch threat check (throttled)
//!
//! Requests are traced and trailing slashes trimmed before routing.

use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;

/// Builds the application router.
///
/// Throttling keys on the peer address unless `state.behind_proxy` is set, in
/// which case `X-Forwarded-For` is used; the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let behind_proxy = state.behind_proxy;

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .merge(api::routes::api_routes(behind_proxy))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
