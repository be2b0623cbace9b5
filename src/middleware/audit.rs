use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{MatchedPath, RawPathParams, Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use serde_json::{json, Map, Value};

use crate::middleware::auth::AuthUser;
use crate::services::LogService;
use crate::state::AppState;

/// Largest request/response body the audit stage will buffer.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Static action tag for a mutating route, keyed by method and matched
/// route pattern. Routes without a tag are not audited.
pub fn action_for(method: &Method, route: &str) -> Option<&'static str> {
    match (method, route) {
        (&Method::POST, "/api/employees") => Some("employee_created"),
        (&Method::PUT, "/api/employees/:id") => Some("employee_updated"),
        (&Method::DELETE, "/api/employees/:id") => Some("employee_deleted"),
        (&Method::POST, "/api/teams") => Some("team_created"),
        (&Method::PUT, "/api/teams/:id") => Some("team_updated"),
        (&Method::DELETE, "/api/teams/:id") => Some("team_deleted"),
        (&Method::POST, "/api/teams/:id/assign") => Some("employee_assigned_to_team"),
        (&Method::DELETE, "/api/teams/:id/unassign") => Some("employee_unassigned_from_team"),
        (&Method::PUT, "/api/users/profile") => Some("profile_updated"),
        _ => None,
    }
}

/// Rewrite team-scoped tags with the team's display name from the response
/// payload, giving the trail a human-readable subject without a second
/// lookup.
pub fn rewrite_action(action: &str, team_name: Option<&str>) -> String {
    if let Some(name) = team_name {
        match action {
            "team_created" => return format!("{} team created", name),
            "team_updated" => return format!("{} team updated", name),
            "team_deleted" => return format!("{} team deleted", name),
            "employee_assigned_to_team" => {
                return format!("employee assigned to {} team", name)
            }
            "employee_unassigned_from_team" => {
                return format!("employee unassigned from {} team", name)
            }
            _ => {}
        }
    }
    if action == "profile_updated" {
        return "profile updated".to_string();
    }
    action.to_string()
}

/// Post-handler audit stage. Runs inside the authentication gate; records a
/// log entry if and only if the route carries an action tag, the response
/// status is in [200,300), and an authenticated actor is present.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());

    let action = match matched.as_deref().and_then(|route| action_for(request.method(), route)) {
        Some(action) => action,
        None => return next.run(request).await,
    };

    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    // Buffer the request body so it can be captured in the meta payload and
    // handed onward to the handler untouched. A body over the limit (or of
    // unknown length) is passed through unbuffered; the entry then carries
    // the route metadata without the payload.
    let (mut parts, body) = request.into_parts();
    let params = path_params(&mut parts).await;

    let (body, body_json) = if within_limit(&body) {
        match axum::body::to_bytes(body, BODY_LIMIT).await {
            Ok(bytes) => {
                let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                (Body::from(bytes), json)
            }
            Err(_) => (Body::empty(), Value::Null),
        }
    } else {
        (body, Value::Null)
    };

    let request = Request::from_parts(parts, body);
    let actor = request.extensions().get::<AuthUser>().cloned();

    let response = next.run(request).await;

    let actor = match actor {
        Some(actor) if response.status().is_success() => actor,
        _ => return response,
    };

    let meta = json!({
        "method": method,
        "path": path,
        "params": params,
        "body": body_json,
    });

    // An oversized response is returned untouched; the entry keeps the
    // static tag since the team name cannot be read out of the payload.
    if !within_limit(response.body()) {
        record_entry(&state, &actor, rewrite_action(action, None), meta);
        return response;
    }

    // Buffer the response to pull the team display name, then restore it.
    // If buffering fails the stale content-length must not survive.
    let (mut res_parts, res_body) = response.into_parts();
    let res_bytes = match axum::body::to_bytes(res_body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            res_parts.headers.remove(header::CONTENT_LENGTH);
            Bytes::new()
        }
    };
    let team_name = serde_json::from_slice::<Value>(&res_bytes)
        .ok()
        .and_then(|v| v.get("teamName").and_then(Value::as_str).map(String::from));

    record_entry(&state, &actor, rewrite_action(action, team_name.as_deref()), meta);

    Response::from_parts(res_parts, Body::from(res_bytes))
}

/// Whether a body is known to fit inside `BODY_LIMIT`. Unknown lengths
/// (streaming bodies) count as over the limit.
fn within_limit(body: &Body) -> bool {
    HttpBody::size_hint(body)
        .upper()
        .map_or(false, |n| n <= BODY_LIMIT as u64)
}

/// Fire and forget: recording failures are swallowed by LogService.
fn record_entry(state: &AppState, actor: &AuthUser, action: String, meta: Value) {
    let log_service = LogService::new(state.db.clone());
    let org_id = actor.org_id;
    let user_id = actor.user_id;
    tokio::spawn(async move {
        log_service.record(org_id, Some(user_id), &action, meta).await;
    });
}

async fn path_params(parts: &mut axum::http::request::Parts) -> Value {
    let mut map = Map::new();
    if let Ok(params) = parts.extract::<RawPathParams>().await {
        for (key, value) in &params {
            map.insert(key.to_string(), json!(value));
        }
    }
    Value::Object(map)
}
