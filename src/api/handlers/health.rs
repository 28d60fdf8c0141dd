//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::infrastructure::threat_check::CircuitState;
use crate::state::AppState;

/// Returns service health with per-component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: every component healthy
/// - **503 Service Unavailable**: at least one component degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` through the link store
/// 2. **Click Queue**: channel open, free slots
/// 3. **Threat Cache**: backend reachability
/// 4. **Circuit Breaker**: threat API breaker not open
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let checks = HealthChecks {
        database: check_database(&state).await,
        click_queue: check_click_queue(&state),
        threat_cache: check_threat_cache(&state).await,
        circuit_breaker: check_circuit_breaker(&state),
    };

    let all_healthy = checks.database.is_ok()
        && checks.click_queue.is_ok()
        && checks.threat_cache.is_ok()
        && checks.circuit_breaker.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    if state.link_repository.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database unreachable")
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_sender.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Free slots: {}/{}",
            state.click_sender.capacity(),
            state.click_sender.max_capacity()
        ))
    }
}

async fn check_threat_cache(state: &AppState) -> CheckStatus {
    let backend = state.threat_cache.backend();
    if state.threat_cache.health_check().await {
        CheckStatus::ok(format!("{backend} cache available"))
    } else {
        CheckStatus::error(format!("{backend} cache unreachable"))
    }
}

fn check_circuit_breaker(state: &AppState) -> CheckStatus {
    let info = state.threat_checker.circuit_breaker_info();
    match info.state {
        CircuitState::Open => CheckStatus::error(format!(
            "Open after {} failures, next attempt at {}",
            info.failure_count,
            info.next_attempt_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        )),
        CircuitState::HalfOpen => CheckStatus::ok("Half-open, probing threat API"),
        CircuitState::Closed => CheckStatus::ok(format!("Closed, {} recent failures", info.failure_count)),
    }
}
