//! End-to-end tests: real listener, real mock upstream, driven with reqwest.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bser_proxy::{ProxyConfig, ProxyServer};
use common::start_mock_upstream;
use tokio::net::TcpListener;

fn test_config(upstream_addr: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.base_url = format!("http://{upstream_addr}");
    config.upstream.api_key = "test-key".to_string();
    config.upstream.timeout_secs = 5;
    // Keep tests fast: effectively no pacing, short cooldown.
    config.rate_limit.requests_per_second = 1000.0;
    config.rate_limit.cooldown_ms = 10;
    config
}

async fn start_proxy(config: ProxyConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ProxyServer::new(config).unwrap();
    tokio::spawn(async move { server.run(listener).await.unwrap() });
    addr
}

#[tokio::test]
async fn forwards_path_query_and_credential() {
    let seen = Arc::new(tokio::sync::Mutex::new(String::new()));
    let record = seen.clone();
    let upstream = start_mock_upstream(move |head| {
        let record = record.clone();
        async move {
            *record.lock().await = head;
            (200, r#"{"code":200,"user":{"userNum":42}}"#.to_string())
        }
    })
    .await;

    let proxy = start_proxy(test_config(upstream)).await;
    let response = reqwest::get(format!(
        "http://{proxy}/api/v1/user/nickname?query=Yuki"
    ))
    .await
    .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["userNum"], 42);

    let head = seen.lock().await.clone();
    assert!(head.starts_with("GET /v1/user/nickname?query=Yuki HTTP/1.1"));
    assert!(head.to_lowercase().contains("x-api-key: test-key"));
}

#[tokio::test]
async fn identical_request_is_served_from_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = start_mock_upstream(move |_| {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            (200, r#"{"code":200,"topRanks":[]}"#.to_string())
        }
    })
    .await;

    let proxy = start_proxy(test_config(upstream)).await;
    let url = format!("http://{proxy}/api/v1/rank/top/35/3");

    let first: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    let second: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // A different query string is a different upstream call.
    let other = format!("http://{proxy}/api/v1/rank/top/35/3?next=1");
    reqwest::get(&other).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn upstream_4xx_body_passes_through() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = start_mock_upstream(move |_| {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            (404, r#"{"code":404,"message":"Not Found"}"#.to_string())
        }
    })
    .await;

    let proxy = start_proxy(test_config(upstream)).await;
    let response = reqwest::get(format!("http://{proxy}/api/v1/games/999"))
        .await
        .unwrap();

    // A 4xx completion relays the upstream's own body, untranslated.
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn error_bodies_are_never_cached() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = start_mock_upstream(move |_| {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            (404, r#"{"code":404}"#.to_string())
        }
    })
    .await;

    let proxy = start_proxy(test_config(upstream)).await;
    let url = format!("http://{proxy}/api/v1/games/999");
    reqwest::get(&url).await.unwrap();
    reqwest::get(&url).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn upstream_5xx_maps_to_generic_error() {
    let upstream =
        start_mock_upstream(|_| async { (500, r#"{"message":"boom"}"#.to_string()) }).await;

    let proxy = start_proxy(test_config(upstream)).await;
    let response = reqwest::get(format!("http://{proxy}/api/v1/data/Character"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "upstream error");
    // Production mode: no underlying detail.
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn development_mode_exposes_detail_and_cache_clear() {
    let upstream =
        start_mock_upstream(|_| async { (500, r#"{"message":"boom"}"#.to_string()) }).await;

    let mut config = test_config(upstream);
    config.development = true;
    let proxy = start_proxy(config).await;

    let response = reqwest::get(format!("http://{proxy}/api/v1/data/Character"))
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "upstream error");
    assert!(body["detail"].as_str().unwrap().contains("boom"));

    let client = reqwest::Client::new();
    let cleared = client
        .post(format!("http://{proxy}/cache/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status().as_u16(), 200);
    let body: serde_json::Value = cleared.json().await.unwrap();
    assert_eq!(body["cleared"], true);
}

#[tokio::test]
async fn cache_clear_is_absent_in_production() {
    let upstream = start_mock_upstream(|_| async { (200, "{}".to_string()) }).await;
    let proxy = start_proxy(test_config(upstream)).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{proxy}/cache/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn rate_limited_upstream_is_retried_until_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = start_mock_upstream(move |_| {
        let counted = counted.clone();
        async move {
            if counted.fetch_add(1, Ordering::SeqCst) < 2 {
                (429, r#"{"message":"Too Many Requests"}"#.to_string())
            } else {
                (200, r#"{"code":200}"#.to_string())
            }
        }
    })
    .await;

    let proxy = start_proxy(test_config(upstream)).await;
    let response = reqwest::get(format!("http://{proxy}/api/v1/user/games/7"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_rate_limit_retries_surface_as_429() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let upstream = start_mock_upstream(move |_| {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            (429, r#"{"message":"Too Many Requests"}"#.to_string())
        }
    })
    .await;

    let mut config = test_config(upstream);
    config.rate_limit.max_retries = 2;
    let proxy = start_proxy(config).await;

    let response = reqwest::get(format!("http://{proxy}/api/v1/user/games/7"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 429);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "too many requests, please wait");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unreachable_upstream_maps_to_bad_gateway() {
    // Grab a port that nothing listens on.
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = unused.local_addr().unwrap();
    drop(unused);

    let proxy = start_proxy(test_config(dead_addr)).await;
    let response = reqwest::get(format!("http://{proxy}/api/v1/data/Character"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "cannot reach upstream");
}

#[tokio::test]
async fn health_reports_queue_and_cache_state() {
    let upstream = start_mock_upstream(|_| async { (200, r#"{"code":200}"#.to_string()) }).await;
    let proxy = start_proxy(test_config(upstream)).await;

    let health: serde_json::Value = reqwest::get(format!("http://{proxy}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["queue_depth"], 0);
    assert_eq!(health["cache_entries"], 0);
    assert!(health["uptime_secs"].is_u64());

    reqwest::get(format!("http://{proxy}/api/v1/data/Character"))
        .await
        .unwrap();

    let health: serde_json::Value = reqwest::get(format!("http://{proxy}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["cache_entries"], 1);
}
