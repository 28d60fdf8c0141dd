//! Per-IP request throttling (token bucket via `tower_governor`).
//!
//! Behind a reverse proxy the peer address is the proxy itself, so the client
//! IP has to come from `X-Forwarded-For` / `X-Real-IP` instead. Those headers
//! are only trusted when the service is configured as being behind a proxy.

use std::sync::Arc;

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::state::AppState;

/// Token bucket parameters for a group of routes.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    /// Seconds between token refills.
    pub per_second: u64,
    pub burst_size: u32,
}

/// Link creation: 1 token every 2s, bursts of 100.
pub const SHORTEN: Quota = Quota {
    per_second: 2,
    burst_size: 100,
};

/// Batch threat checks spend upstream budget, so they get a tighter bucket.
pub const THREAT_CHECK: Quota = Quota {
    per_second: 1,
    burst_size: 10,
};

type Layer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Builds a governor layer keyed by `key_extractor`.
///
/// Requests over the quota receive `429 Too Many Requests`.
pub fn layer<K: KeyExtractor>(key_extractor: K, quota: Quota) -> Layer<K> {
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(quota.per_second)
        .burst_size(quota.burst_size)
        .finish()
        .expect("quota constants are non-zero");

    GovernorLayer::new(Arc::new(governor_conf))
}

/// Throttles every route in `router` per client IP.
pub fn apply(router: Router<AppState>, quota: Quota, behind_proxy: bool) -> Router<AppState> {
    if behind_proxy {
        router.layer(layer(SmartIpKeyExtractor, quota))
    } else {
        router.layer(layer(PeerIpKeyExtractor, quota))
    }
}
