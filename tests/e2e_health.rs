//! E2E tests for health, info, static assets and basic server functionality

mod common;

use common::{TestServer, location};

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, r#"{"alive": true}"#);
}

#[tokio::test]
async fn test_server_info_reports_version_and_uptime() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/info/"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["start"].is_string());
    assert!(body["uptime"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_landing_page_is_public() {
    let server = TestServer::new().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("landing"));
}

#[tokio::test]
async fn test_public_assets_are_served_without_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/static/s/app.js"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "console.log('starz');");
}

#[tokio::test]
async fn test_metrics_requires_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_metrics_accepts_session_cookie() {
    let server = TestServer::new().await;
    starz::metrics::init_metrics();

    let response = server
        .client
        .get(server.url("/metrics"))
        .header("Cookie", server.session_cookie("octocat"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("starz_app_uptime_seconds"));
}
