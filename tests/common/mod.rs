#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use url::Url;

use safe_shortener::application::services::LinkSettings;
use safe_shortener::domain::click_event::ClickEvent;
use safe_shortener::domain::entities::{Link, NewLink, ThreatDetectionResult, ThreatInfo};
use safe_shortener::domain::repositories::LinkRepository;
use safe_shortener::error::AppError;
use safe_shortener::infrastructure::cache::{MemoryCache, NullCache, ThreatCache};
use safe_shortener::infrastructure::threat_check::{
    CircuitBreaker, CircuitBreakerInfo, RateLimitInfo, RateLimiter, SafeBrowsingClient,
    ThreatCheckConfig, ThreatCheckError, ThreatChecker,
};
use safe_shortener::state::AppState;

pub const BASE_URL: &str = "https://sho.rt";

// ── Link store double ───────────────────────────────────────────────────────

/// Link store kept in a `HashMap`, with a switch to simulate an outage.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<HashMap<String, Link>>,
    pub unavailable: AtomicBool,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, code: &str, long_url: &str) {
        self.links.lock().unwrap().insert(
            code.to_string(),
            Link::new(code.to_string(), long_url.to_string(), 0, Utc::now()),
        );
    }

    pub fn get(&self, code: &str) -> Option<Link> {
        self.links.lock().unwrap().get(code).cloned()
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::internal("Database error", json!({})))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        self.check_available()?;
        Ok(self.links.lock().unwrap().contains_key(short_code))
    }

    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        self.check_available()?;
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.short_code) {
            return Err(AppError::conflict("Unique constraint violation", json!({})));
        }

        let link = Link::new(new_link.short_code.clone(), new_link.long_url, 0, Utc::now());
        links.insert(new_link.short_code, link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError> {
        self.check_available()?;
        Ok(self.get(short_code))
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<bool, AppError> {
        self.check_available()?;
        Ok(match self.links.lock().unwrap().get_mut(short_code) {
            Some(link) => {
                link.click_count += 1;
                true
            }
            None => false,
        })
    }

    async fn health_check(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}

// ── Threat checker double ───────────────────────────────────────────────────

/// Flags any URL containing `malware.test`; can be switched to fail.
pub struct StubThreatChecker {
    pub calls: AtomicUsize,
    failure: Mutex<Option<fn() -> ThreatCheckError>>,
}

impl StubThreatChecker {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    pub fn failing(make_error: fn() -> ThreatCheckError) -> Self {
        let stub = Self::new();
        *stub.failure.lock().unwrap() = Some(make_error);
        stub
    }
}

#[async_trait]
impl ThreatChecker for StubThreatChecker {
    async fn check_urls(
        &self,
        urls: &[String],
    ) -> Result<Vec<ThreatDetectionResult>, ThreatCheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = *self.failure.lock().unwrap() {
            return Err(make_error());
        }

        Ok(urls
            .iter()
            .map(|url| {
                let mut result = ThreatDetectionResult::safe(url.clone(), Utc::now());
                if url.contains("malware.test") {
                    result.is_safe = false;
                    result.threats.push(ThreatInfo {
                        threat_type: "MALWARE".to_string(),
                        platform: "ANY_PLATFORM".to_string(),
                        description: "Malware".to_string(),
                    });
                }
                result
            })
            .collect())
    }

    fn circuit_breaker_info(&self) -> CircuitBreakerInfo {
        CircuitBreaker::default().info(Instant::now())
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        let now = Instant::now();
        RateLimiter::new(1000, Duration::from_secs(60), now).info(now)
    }
}

// ── App state ───────────────────────────────────────────────────────────────

pub fn create_test_state(
    repository: Arc<InMemoryLinkRepository>,
    checker: Arc<dyn ThreatChecker>,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let settings = LinkSettings::new(Url::parse(BASE_URL).unwrap());

    let state = AppState::new(
        repository,
        checker,
        Arc::new(NullCache::new()),
        tx,
        settings,
        false,
    );

    (state, rx)
}

// ── Fake threat intelligence API ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum UpstreamMode {
    /// Report every requested URL containing `malware.test` as MALWARE.
    Matches,
    /// Reply with a fixed JSON body.
    Body(Value),
    Status(u16),
    Delay(Duration),
    Garbage,
}

pub struct FakeUpstream {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<(Value, Option<String>)>>>,
    mode: Arc<Mutex<UpstreamMode>>,
}

impl FakeUpstream {
    pub fn set_mode(&self, mode: UpstreamMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Body and `key` query parameter of the most recent request.
    pub fn last_request(&self) -> Option<(Value, Option<String>)> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn config(&self) -> ThreatCheckConfig {
        ThreatCheckConfig {
            api_key: Some("test-key".to_string()),
            api_url: self.url.clone(),
            client_id: "test-client".to_string(),
            timeout: Duration::from_secs(2),
            ..ThreatCheckConfig::default()
        }
    }

    pub fn client(&self, config: ThreatCheckConfig) -> SafeBrowsingClient {
        SafeBrowsingClient::new(config, Arc::new(NullCache::new())).unwrap()
    }

    pub fn client_with_cache(
        &self,
        config: ThreatCheckConfig,
        cache: Arc<dyn ThreatCache>,
    ) -> SafeBrowsingClient {
        SafeBrowsingClient::new(config, cache).unwrap()
    }

    pub fn memory_cache() -> Arc<dyn ThreatCache> {
        Arc::new(MemoryCache::new(Duration::from_secs(60)))
    }
}

#[derive(Clone)]
struct UpstreamState {
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(Value, Option<String>)>>>,
    mode: Arc<Mutex<UpstreamMode>>,
}

async fn find_threat_matches(
    State(state): State<UpstreamState>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some((body.clone(), query.get("key").cloned()));

    let mode = state.mode.lock().unwrap().clone();
    match mode {
        UpstreamMode::Matches => {
            let matches: Vec<Value> = body["threatInfo"]["threatEntries"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|entry| entry["url"].as_str())
                .filter(|url| url.contains("malware.test"))
                .map(|url| {
                    json!({
                        "threatType": "MALWARE",
                        "platformType": "ANY_PLATFORM",
                        "threatEntryType": "URL",
                        "threat": { "url": url },
                        "cacheDuration": "300s"
                    })
                })
                .collect();

            if matches.is_empty() {
                Json(json!({})).into_response()
            } else {
                Json(json!({ "matches": matches })).into_response()
            }
        }
        UpstreamMode::Body(value) => Json(value).into_response(),
        UpstreamMode::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": { "code": code, "message": "upstream failure" } })),
        )
            .into_response(),
        UpstreamMode::Delay(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({})).into_response()
        }
        UpstreamMode::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

/// Starts a local stand-in for the threat API on an ephemeral port.
pub async fn spawn_fake_upstream(mode: UpstreamMode) -> FakeUpstream {
    let state = UpstreamState {
        hits: Arc::new(AtomicUsize::new(0)),
        last_request: Arc::new(Mutex::new(None)),
        mode: Arc::new(Mutex::new(mode)),
    };

    let app = Router::new()
        .route("/v4/threatMatches", post(find_threat_matches))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeUpstream {
        url: format!("http://{addr}/v4/threatMatches"),
        hits: state.hits,
        last_request: state.last_request,
        mode: state.mode,
    }
}
