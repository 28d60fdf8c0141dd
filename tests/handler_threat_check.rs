mod common;

use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::post};
use axum_test::TestServer;
use common::{FakeUpstream, InMemoryLinkRepository, UpstreamMode, spawn_fake_upstream};
use safe_shortener::api::handlers::threat_check_handler;
use safe_shortener::infrastructure::threat_check::ThreatCheckConfig;
use serde_json::{Value, json};

fn server(upstream: &FakeUpstream, config: ThreatCheckConfig) -> TestServer {
    let (state, _rx) = common::create_test_state(
        Arc::new(InMemoryLinkRepository::new()),
        Arc::new(upstream.client(config)),
    );
    let app = Router::new()
        .route("/threat-check", post(threat_check_handler))
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_threat_check_single_url() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": "example.com" }))
        .await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["results"][0]["url"], "http://example.com");
    assert_eq!(json["results"][0]["isSafe"], true);
    assert_eq!(json["metadata"]["totalUrls"], 1);
    assert!(json["metadata"].get("clientId").is_none());
}

#[tokio::test]
async fn test_threat_check_batch_with_metadata() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    let response = server
        .post("/threat-check")
        .json(&json!({
            "urls": ["https://safe.example/", "http://malware.test/x", "https://other.example/"],
            "clientId": "scanner-7"
        }))
        .await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1]["url"], "http://malware.test/x");
    assert_eq!(results[1]["isSafe"], false);
    assert_eq!(results[1]["threats"][0]["type"], "MALWARE");
    assert_eq!(results[1]["threats"][0]["description"], "Malware");
    assert!(results[1]["cacheExpiresAt"].is_string());

    let metadata = &json["metadata"];
    assert_eq!(metadata["totalUrls"], 3);
    assert_eq!(metadata["safeUrls"], 2);
    assert_eq!(metadata["unsafeUrls"], 1);
    assert_eq!(metadata["clientId"], "scanner-7");
    assert!(metadata["checkedAt"].is_string());
    assert_eq!(metadata["rateLimit"]["limit"], 1000);
    assert_eq!(metadata["rateLimit"]["remaining"], 999);
    assert_eq!(metadata["circuitBreaker"]["state"], "CLOSED");
    assert_eq!(metadata["circuitBreaker"]["failureCount"], 0);
}

#[tokio::test]
async fn test_threat_check_no_urls() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    for body in [json!({}), json!({ "urls": [] })] {
        let response = server.post("/threat-check").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["details"]["reason"],
            "NO_URLS_PROVIDED"
        );
    }
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_threat_check_too_many_urls() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    let urls: Vec<String> = (0..501).map(|i| format!("https://site{i}.example/")).collect();
    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": urls }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "TOO_MANY_URLS"
    );
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_threat_check_blank_entry() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": ["https://example.com", "   "] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "INVALID_URL"
    );
}

#[tokio::test]
async fn test_threat_check_missing_api_key() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let config = ThreatCheckConfig {
        api_key: None,
        ..upstream.config()
    };
    let server = server(&upstream, config);

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": ["https://example.com"] }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "MISSING_API_KEY"
    );
}

#[tokio::test]
async fn test_threat_check_upstream_error() {
    let upstream = spawn_fake_upstream(UpstreamMode::Status(500)).await;
    let server = server(&upstream, upstream.config());

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": ["https://example.com"] }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["details"]["reason"], "API_ERROR");
    assert_eq!(json["error"]["details"]["upstream_status"], 500);
}

#[tokio::test]
async fn test_threat_check_rate_limited() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let config = ThreatCheckConfig {
        rate_limit: 1,
        ..upstream.config()
    };
    let server = server(&upstream, config);

    server
        .post("/threat-check")
        .json(&json!({ "urls": ["https://one.example"] }))
        .await
        .assert_status_ok();

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": ["https://two.example"] }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["details"]["reason"], "RATE_LIMIT_EXCEEDED");
    assert!(json["error"]["details"]["retry_after_secs"].is_u64());
}

#[tokio::test]
async fn test_threat_check_invalid_json() {
    let upstream = spawn_fake_upstream(UpstreamMode::Matches).await;
    let server = server(&upstream, upstream.config());

    let response = server
        .post("/threat-check")
        .json(&json!({ "urls": 42 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}
