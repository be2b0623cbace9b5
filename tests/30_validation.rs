mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use hrm_api::database::models::Role;

#[tokio::test]
async fn create_employee_requires_name_and_email() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "POST",
        "/api/employees",
        Some(&token),
        json!({ "firstName": "Ada" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "First name, last name, and email are required");
}

#[tokio::test]
async fn create_employee_rejects_bad_email() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "POST",
        "/api/employees",
        Some(&token),
        json!({ "firstName": "Ada", "lastName": "Lovelace", "email": "ada-at-acme" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_employee_rejects_blanked_required_field() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "PUT",
        &format!("/api/employees/{}", uuid::Uuid::new_v4()),
        Some(&token),
        json!({ "firstName": "" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_employee_rejects_null_required_field() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "PUT",
        &format!("/api/employees/{}", uuid::Uuid::new_v4()),
        Some(&token),
        json!({ "lastName": null }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_team_requires_name() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "POST",
        "/api/teams",
        Some(&token),
        json!({ "description": "no name" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Team name is required");
}

#[tokio::test]
async fn assign_requires_employee_id() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::json_request(
        "POST",
        &format!("/api/teams/{}/assign", uuid::Uuid::new_v4()),
        Some(&token),
        json!({}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Employee ID is required");
}

#[tokio::test]
async fn unassign_requires_employee_id() {
    let app = common::app();

    let token = common::token_for(Role::User);
    let request = common::json_request(
        "DELETE",
        &format!("/api/teams/{}/unassign", uuid::Uuid::new_v4()),
        Some(&token),
        json!({}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_uuid_path_parameter_gets_the_error_envelope() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let response = app
        .oneshot(common::get_with_token("/api/employees/not-a-uuid", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_json_body_gets_the_error_envelope() {
    let app = common::app();

    let request = common::raw_request("POST", "/api/auth/register", None, "{not json");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_json_on_protected_route_gets_the_error_envelope() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let request = common::raw_request("POST", "/api/teams", Some(&token), "[[[");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bad_query_parameter_gets_the_error_envelope() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let response = app
        .oneshot(common::get_with_token("/api/logs?userId=x", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn oversized_body_on_audited_route_gets_the_error_envelope() {
    let app = common::app();

    let token = common::token_for(Role::Admin);
    let huge = format!(r#"{{"firstName":"{}"}}"#, "x".repeat(3 * 1024 * 1024));
    let request = common::raw_request("POST", "/api/employees", Some(&token), &huge);
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
}
