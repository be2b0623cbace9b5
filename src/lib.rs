pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;

/// Build the full application router. Protected routes sit behind the
/// access-control gate; the audit stage runs inside the gate so the actor
/// is available when a mutating request resolves.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(employee_routes())
        .merge(team_routes())
        .merge(user_routes())
        .merge(log_routes())
        .layer(from_fn_with_state(state.clone(), middleware::audit::audit_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::auth::auth_middleware));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(protected)
        .fallback(route_not_found)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn employee_routes() -> Router<AppState> {
    use handlers::employees;

    Router::new()
        .route("/api/employees", get(employees::list).post(employees::create))
        .route(
            "/api/employees/:id",
            get(employees::get).put(employees::update).delete(employees::delete),
        )
}

fn team_routes() -> Router<AppState> {
    use handlers::teams;

    Router::new()
        .route("/api/teams", get(teams::list).post(teams::create))
        .route(
            "/api/teams/:id",
            get(teams::get).put(teams::update).delete(teams::delete),
        )
        // Membership assignment
        .route("/api/teams/:id/assign", post(teams::assign))
        .route("/api/teams/:id/unassign", axum::routing::delete(teams::unassign))
        // Which teams an employee belongs to
        .route("/api/teams/employee/:employeeId/teams", get(teams::employee_teams))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new().route(
        "/api/users/profile",
        get(users::profile).put(users::update_profile),
    )
}

fn log_routes() -> Router<AppState> {
    use handlers::logs;

    Router::new().route(
        "/api/logs",
        get(logs::list).route_layer(from_fn(middleware::auth::require_admin)),
    )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "HRM API is running",
    }))
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
        })),
    )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
