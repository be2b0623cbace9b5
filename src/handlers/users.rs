use axum::{extract::State, Extension};
use serde_json::json;

use crate::api::Json;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{ProfileChanges, UserService};
use crate::state::AppState;

/// GET /api/users/profile - the calling user with its organisation.
pub async fn profile(State(state): State<AppState>, Extension(actor): Extension<AuthUser>) -> ApiResult {
    let profile = UserService::new(state.db.clone()).profile(actor.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/users/profile - update name and/or email; a new email must not
/// belong to any other user.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult {
    let user = UserService::new(state.db.clone())
        .update_profile(actor.user_id, changes)
        .await?;

    Ok(ApiResponse::success(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    }))
    .with_message("Profile updated successfully"))
}
