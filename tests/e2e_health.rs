//! Health and metrics endpoint tests

mod common;

use common::TestServer;

#[tokio::test]
async fn health_check_returns_ok() {
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}
