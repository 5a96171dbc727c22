//! Integration tests for the fetch layer against a mock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use aptnotes_core::{FetchError, Fetcher, HttpClient};
use serde::Deserialize;
use tokio::task::JoinSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[macro_use]
mod support;

fn fetcher(limit: usize) -> Fetcher {
    Fetcher::new(
        HttpClient::with_timeouts(5, 10).unwrap_or_else(|e| panic!("client: {e}")),
        limit,
    )
}

#[tokio::test]
async fn test_fetch_bytes_returns_body() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()))
        .mount(&server)
        .await;

    let body = fetcher(2)
        .fetch_bytes(&format!("{}/report.pdf", server.uri()))
        .await?;
    assert_eq!(body, b"%PDF-1.4 body");
    Ok(())
}

#[tokio::test]
async fn test_fetch_not_found_is_http_status() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetcher(1).fetch_bytes(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }), "{err}");
    assert_eq!(err.url(), url);
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn test_fetch_text_reads_landing_page() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/s/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><body>caf\u{e9}</body></html>"),
        )
        .mount(&server)
        .await;

    let page = fetcher(1)
        .fetch_text(&format!("{}/s/abc", server.uri()))
        .await?;
    assert!(page.contains("caf\u{e9}"));
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "Filename")]
    filename: String,
}

#[tokio::test]
async fn test_fetch_json_ignores_content_type() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/APTnotes.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_string(r#"[{"Filename": "apt1"}]"#),
        )
        .mount(&server)
        .await;

    let entries: Vec<Entry> = fetcher(1)
        .fetch_json(&format!("{}/APTnotes.json", server.uri()))
        .await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].filename, "apt1");
    Ok(())
}

#[tokio::test]
async fn test_fetch_json_shape_mismatch_is_decode() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/APTnotes.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"not": "an array"}"#))
        .mount(&server)
        .await;

    let err = fetcher(1)
        .fetch_json::<Vec<Entry>>(&format!("{}/APTnotes.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_fetch_invalid_url_never_hits_network() {
    let err = fetcher(1).fetch_bytes("ftp://example.com/x").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }), "{err}");
}

#[tokio::test]
async fn test_limiter_bounds_in_flight_requests() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"x".to_vec())
                .set_delay(Duration::from_millis(150)),
        )
        .expect(6)
        .mount(&server)
        .await;

    let fetcher = fetcher(2);
    let url = format!("{}/slow", server.uri());
    let done = Arc::new(AtomicBool::new(false));
    let peak = Arc::new(AtomicUsize::new(0));

    let watcher = {
        let fetcher = fetcher.clone();
        let done = Arc::clone(&done);
        let peak = Arc::clone(&peak);
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                peak.fetch_max(fetcher.in_flight(), Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let mut tasks = JoinSet::new();
    for _ in 0..6 {
        let fetcher = fetcher.clone();
        let url = url.clone();
        tasks.spawn(async move { fetcher.fetch_bytes(&url).await });
    }
    while let Some(result) = tasks.join_next().await {
        result??;
    }
    done.store(true, Ordering::SeqCst);
    watcher.await?;

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "observed {peak} requests in flight");
    assert!(peak >= 1);
    assert_eq!(fetcher.in_flight(), 0);
    Ok(())
}

#[tokio::test]
async fn test_with_limit_gets_independent_limiter() {
    let shared = fetcher(4);
    let own = shared.with_limit(1);
    assert_eq!(shared.limit(), 4);
    assert_eq!(own.limit(), 1);
    assert_eq!(own.in_flight(), 0);
}
