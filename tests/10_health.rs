mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_ok() {
    let app = common::app();

    let response = app.oneshot(common::get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "HRM API is running");
}

#[tokio::test]
async fn unknown_route_returns_envelope_404() {
    let app = common::app();

    let response = app.oneshot(common::get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn unknown_auth_route_returns_envelope_404() {
    let app = common::app();

    let response = app.oneshot(common::get("/api/auth/whoami")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}
