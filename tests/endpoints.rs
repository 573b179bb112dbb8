//! Health and info endpoints.

use axum::http::StatusCode;

use tcp_bridge::config::BridgeConfig;

mod common;

#[tokio::test]
async fn health_answers_ok_for_any_method() {
    let bridge = common::start_bridge(BridgeConfig::default()).await;
    let client = common::http_client();

    let res = client.get(bridge.http_url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client.post(bridge.http_url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn root_describes_the_service() {
    let bridge = common::start_bridge(BridgeConfig::default()).await;

    let res = common::http_client()
        .get(bridge.http_url("/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["service"], "tcp-bridge");
    assert_eq!(body["usage"], "wss://HOST/tcp?host=TARGET&port=PORT");
    assert_eq!(body["status"], "ready");
    assert!(body["example"].as_str().unwrap().contains("/tcp?host="));
}

#[tokio::test]
async fn unknown_paths_fall_back_to_info() {
    let bridge = common::start_bridge(BridgeConfig::default()).await;

    let res = common::http_client()
        .get(bridge.http_url("/some/other/path"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["service"], "tcp-bridge");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let bridge = common::start_bridge(BridgeConfig::default()).await;

    let res = common::http_client()
        .get(bridge.http_url("/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}
