use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::api::{is_valid_email, Json};
use crate::auth::{generate_token, hash_password, verify_password, Claims};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{LogService, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub org_name: Option<String>,
    pub admin_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/register - create an organisation with its first (admin)
/// user and issue a credential.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult {
    let (org_name, admin_name, email, password) = match (
        non_empty(payload.org_name),
        non_empty(payload.admin_name),
        non_empty(payload.email),
        non_empty(payload.password),
    ) {
        (Some(o), Some(a), Some(e), Some(p)) => (o, a, e, p),
        _ => return Err(ApiError::validation("All fields are required")),
    };

    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    let users = UserService::new(state.db.clone());
    if users.email_exists(&email).await? {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let password_hash = hash_password(&password)?;
    let (organisation, user) = users
        .register_organisation(&org_name, &admin_name, &email, &password_hash)
        .await?;

    LogService::new(state.db.clone())
        .record(
            organisation.id,
            Some(user.id),
            "organisation_created",
            json!({
                "organisationName": organisation.name,
                "adminEmail": user.email,
            }),
        )
        .await;

    let claims = Claims::new(
        user.id,
        organisation.id,
        user.email.clone(),
        user.role,
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_token(&claims, &state.config.security)?;

    Ok(ApiResponse::created(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "organisationId": organisation.id,
            "organisationName": organisation.name,
        },
    }))
    .with_message("Organisation registered successfully"))
}

/// POST /api/auth/login - verify credentials and issue a fresh credential.
/// Unknown email and wrong password produce the same message, so accounts
/// cannot be enumerated.
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> ApiResult {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(ApiError::validation("Email and password are required")),
    };

    let users = UserService::new(state.db.clone());
    let found = users
        .find_for_login(&email)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Invalid email or password"))?;

    if !verify_password(&password, &found.user.password_hash)? {
        return Err(ApiError::unauthenticated("Invalid email or password"));
    }

    let user = found.user;
    LogService::new(state.db.clone())
        .record(
            user.organisation_id,
            Some(user.id),
            "login",
            json!({ "email": user.email }),
        )
        .await;

    let claims = Claims::new(
        user.id,
        user.organisation_id,
        user.email.clone(),
        user.role,
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_token(&claims, &state.config.security)?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "organisationId": user.organisation_id,
            "organisationName": found.organisation_name,
        },
    }))
    .with_message("Login successful"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
