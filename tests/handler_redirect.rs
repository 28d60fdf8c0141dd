mod common;

use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use common::{InMemoryLinkRepository, StubThreatChecker};
use safe_shortener::api::handlers::redirect_handler;
use safe_shortener::domain::click_event::ClickEvent;
use serde_json::Value;
use tokio::sync::mpsc;

fn server(repo: Arc<InMemoryLinkRepository>) -> (TestServer, mpsc::Receiver<ClickEvent>) {
    let (state, rx) = common::create_test_state(repo, Arc::new(StubThreatChecker::new()));
    let app = Router::new()
        .route("/{code}", get(redirect_handler))
        .with_state(state);

    (TestServer::new(app).unwrap(), rx)
}

#[tokio::test]
async fn test_redirect_success() {
    let repo = Arc::new(InMemoryLinkRepository::new());
    repo.seed("abc123", "https://example.com/landing?ref=1");
    let (server, mut rx) = server(repo);

    let response = server.get("/abc123").await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.header("location"),
        "https://example.com/landing?ref=1"
    );

    let event = rx.try_recv().expect("click should be queued");
    assert_eq!(event.short_code, "abc123");
}

#[tokio::test]
async fn test_redirect_does_not_count_inline() {
    let repo = Arc::new(InMemoryLinkRepository::new());
    repo.seed("abc123", "https://example.com/");
    let (server, _rx) = server(repo.clone());

    server
        .get("/abc123")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    // Counting is the click worker's job.
    assert_eq!(repo.get("abc123").unwrap().click_count, 0);
}

#[tokio::test]
async fn test_redirect_survives_closed_click_queue() {
    let repo = Arc::new(InMemoryLinkRepository::new());
    repo.seed("abc123", "https://example.com/");
    let (server, rx) = server(repo);
    drop(rx);

    server
        .get("/abc123")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (server, mut rx) = server(Arc::new(InMemoryLinkRepository::new()));

    let response = server.get("/nope42").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["details"]["code"], "nope42");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_invalid_code_format() {
    let (server, _rx) = server(Arc::new(InMemoryLinkRepository::new()));

    for code in ["abc", "abcdefghi", "abc-12", "abc_12"] {
        let response = server.get(&format!("/{code}")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["code"],
            "validation_error",
            "{code}"
        );
    }
}

#[tokio::test]
async fn test_redirect_refuses_corrupt_stored_url() {
    let repo = Arc::new(InMemoryLinkRepository::new());
    repo.seed("bad123", "javascript:alert(1)");
    let (server, mut rx) = server(repo);

    let response = server.get("/bad123").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get("location").is_none());
    assert!(rx.try_recv().is_err());
}
