//! Integration tests for the landing page and `/assets/*`.

mod helpers;

use http::{StatusCode, header};

use helpers::{INDEX_HTML, TestApp};

#[tokio::test]
async fn test_index_serves_landing_page() {
    let app = TestApp::new().await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert_eq!(response.text(), INDEX_HTML);
}

#[tokio::test]
async fn test_missing_index_is_server_error() {
    let app = TestApp::new().await;
    std::fs::remove_file(&app.config.assets.index_file).unwrap();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_asset_served_with_content_type() {
    let app = TestApp::new().await;

    let response = app.get("/assets/style.css").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "text/css");
    assert_eq!(response.headers[header::CONTENT_LENGTH], "19");
    assert_eq!(response.text(), "body { margin: 0; }");
}

#[tokio::test]
async fn test_nested_asset() {
    let app = TestApp::new().await;

    let response = app.get("/assets/js/app.js").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript")
    );
    assert_eq!(response.text(), "console.log('hi');");
}

#[tokio::test]
async fn test_parent_reference_is_rejected() {
    let app = TestApp::new().await;

    for path in [
        "/assets/../../secret.txt",
        "/assets/js/../../../secret.txt",
        "/assets/%2e%2e/%2e%2e/secret.txt",
        "/assets/..%2f..%2fsecret.txt",
        "/assets/..%5c..%5csecret.txt",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert!(!response.text().contains("top secret"), "{path}");
    }
}

#[tokio::test]
async fn test_missing_asset_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/assets/nope.css").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_is_not_served() {
    let app = TestApp::new().await;

    let response = app.get("/assets/js").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/admin").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
