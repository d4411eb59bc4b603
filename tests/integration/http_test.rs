//! Integration tests for the HTTP routes.

use http::{StatusCode, header};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_index_page() {
    let app = TestApp::new().await;

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("viewer"));
}

#[tokio::test]
async fn test_static_file() {
    let app = TestApp::new().await;

    let response = app.get("/static/app.js").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "start();");
}

#[tokio::test]
async fn test_asset_from_disk() {
    let app = TestApp::new().await;

    let response = app.get("/asset/models/cube.obj").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"v 0 0 0");
}

#[tokio::test]
async fn test_missing_asset_is_500_text() {
    let app = TestApp::new().await;

    let response = app.get("/asset/models/sphere.obj").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        response.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(response.text().contains("sphere.obj"));
}

#[tokio::test]
async fn test_asset_traversal_is_rejected() {
    let app = TestApp::new().await;

    let response = app.get("/asset/../index.html").await;
    assert_ne!(response.status, StatusCode::OK);
    assert!(!response.text().contains("<html>"));
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections_active"], 0);
    assert_eq!(body["metrics"]["connections_total"], 0);
    assert!(body["version"].is_string());
}
