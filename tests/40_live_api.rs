//! Storage-backed behaviour, run against a real database:
//!
//!     DATABASE_URL=postgres://... cargo test -- --ignored
//!
//! Each test registers its own organisation(s), so reruns against the same
//! database do not collide.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn create_employee(app: &axum::Router, token: &str) -> Uuid {
    let request = common::json_request(
        "POST",
        "/api/employees",
        Some(token),
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": format!("ada-{}@acme.test", Uuid::new_v4()),
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = common::body_json(response).await;
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

async fn create_team(app: &axum::Router, token: &str, name: &str, employee_ids: Value) -> Uuid {
    let request = common::json_request(
        "POST",
        "/api/teams",
        Some(token),
        json!({ "name": name, "employeeIds": employee_ids }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = common::body_json(response).await;
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
#[ignore]
async fn records_are_invisible_across_organisations() {
    let app = common::live_app().await;
    let token_a = common::register_org(&app, "Org A").await;
    let token_b = common::register_org(&app, "Org B").await;

    let employee_id = create_employee(&app, &token_a).await;
    let team_id = create_team(&app, &token_a, "Engineering", json!([])).await;

    // Reads from the other organisation resolve as if the record never
    // existed
    let response = app
        .clone()
        .oneshot(common::get_with_token(
            &format!("/api/employees/{}", employee_id),
            &token_b,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Employee not found");

    let response = app
        .clone()
        .oneshot(common::get_with_token(&format!("/api/teams/{}", team_id), &token_b))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Team not found");

    // So do writes
    let request = common::json_request(
        "DELETE",
        &format!("/api/employees/{}", employee_id),
        Some(&token_b),
        json!({}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The record is still there for its owner
    let response = app
        .clone()
        .oneshot(common::get_with_token(
            &format!("/api/employees/{}", employee_id),
            &token_a,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn membership_is_exclusive_and_unassign_requires_it() {
    let app = common::live_app().await;
    let token = common::register_org(&app, "Org M").await;

    let employee_id = create_employee(&app, &token).await;
    let team_id = create_team(&app, &token, "Platform", json!([])).await;

    let assign = |app: axum::Router, token: String| async move {
        let request = common::json_request(
            "POST",
            &format!("/api/teams/{}/assign", team_id),
            Some(&token),
            json!({ "employeeId": employee_id }),
        );
        app.oneshot(request).await.unwrap()
    };

    let response = assign(app.clone(), token.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = assign(app.clone(), token.clone()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Employee is already assigned to this team");

    let unassign = |app: axum::Router, token: String| async move {
        let request = common::json_request(
            "DELETE",
            &format!("/api/teams/{}/unassign", team_id),
            Some(&token),
            json!({ "employeeId": employee_id }),
        );
        app.oneshot(request).await.unwrap()
    };

    let response = unassign(app.clone(), token.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = unassign(app.clone(), token.clone()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Employee is not assigned to this team");
}

#[tokio::test]
#[ignore]
async fn bad_member_rolls_back_team_creation() {
    let app = common::live_app().await;
    let token = common::register_org(&app, "Org R").await;

    let name = format!("Ghost-{}", Uuid::new_v4());
    let request = common::json_request(
        "POST",
        "/api/teams",
        Some(&token),
        json!({ "name": name, "employeeIds": [Uuid::new_v4()] }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(
        body["message"],
        "One or more employees not found or do not belong to your organisation"
    );

    // No partial team survives the rollback
    let response = app
        .clone()
        .oneshot(common::get_with_token("/api/teams", &token))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let leaked = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|team| team["name"] == name.as_str());
    assert!(!leaked);
}

#[tokio::test]
#[ignore]
async fn mutations_land_in_the_audit_trail() {
    let app = common::live_app().await;
    let token = common::register_org(&app, "Org L").await;

    let employee_id = create_employee(&app, &token).await;
    let team_name = format!("Audit-{}", Uuid::new_v4());
    let team_id = create_team(&app, &token, &team_name, json!([employee_id])).await;

    let request = common::json_request(
        "PUT",
        &format!("/api/teams/{}", team_id),
        Some(&token),
        json!({ "name": team_name }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Entries are written off the request path; give them a moment to land
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let response = app
        .clone()
        .oneshot(common::get_with_token("/api/logs?limit=50", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let actions: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap().to_string())
        .collect();

    assert!(actions.iter().any(|a| a == "organisation_created"));
    assert!(actions.iter().any(|a| a == "employee_created"));
    assert!(actions.iter().any(|a| *a == format!("{} team created", team_name)));
    assert!(actions.iter().any(|a| *a == format!("{} team updated", team_name)));

    // The trail is tenant-scoped: a fresh organisation sees none of it
    let other = common::register_org(&app, "Org L2").await;
    let response = app
        .clone()
        .oneshot(common::get_with_token("/api/logs?limit=200", &other))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let foreign = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|entry| entry["action"] == format!("{} team created", team_name));
    assert!(!foreign);
}
