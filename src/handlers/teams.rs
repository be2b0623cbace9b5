use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{Json, Path};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{TeamChanges, TeamService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub employee_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub employee_id: Option<Uuid>,
}

/// GET /api/teams - all teams in the caller's organisation, newest first,
/// with member employees embedded.
pub async fn list(State(state): State<AppState>, Extension(actor): Extension<AuthUser>) -> ApiResult {
    let teams = TeamService::new(state.db.clone()).list(actor.org_id).await?;
    Ok(ApiResponse::success(teams))
}

/// GET /api/teams/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let team = TeamService::new(state.db.clone()).get(actor.org_id, id).await?;
    Ok(ApiResponse::success(team))
}

/// POST /api/teams - create a team, atomically assigning any supplied
/// initial members.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult {
    let name = payload
        .name
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Team name is required"))?;

    let team = TeamService::new(state.db.clone())
        .create_with_members(
            actor.org_id,
            &name,
            payload.description.as_deref(),
            &payload.employee_ids,
        )
        .await?;

    let team_name = team.team.name.clone();
    Ok(ApiResponse::created(team)
        .with_message("Team created successfully")
        .with_team_name(team_name))
}

/// PUT /api/teams/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<TeamChanges>,
) -> ApiResult {
    let team = TeamService::new(state.db.clone())
        .update(actor.org_id, id, changes)
        .await?;

    let team_name = team.name.clone();
    Ok(ApiResponse::success(team)
        .with_message("Team updated successfully")
        .with_team_name(team_name))
}

/// DELETE /api/teams/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let team = TeamService::new(state.db.clone()).delete(actor.org_id, id).await?;
    Ok(ApiResponse::message("Team deleted successfully").with_team_name(team.name))
}

/// POST /api/teams/:id/assign
pub async fn assign(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<MembershipRequest>,
) -> ApiResult {
    let employee_id = payload
        .employee_id
        .ok_or_else(|| ApiError::validation("Employee ID is required"))?;

    let team = TeamService::new(state.db.clone())
        .assign(actor.org_id, team_id, employee_id)
        .await?;

    Ok(ApiResponse::message("Employee assigned to team successfully")
        .with_status(axum::http::StatusCode::CREATED)
        .with_team_name(team.name))
}

/// DELETE /api/teams/:id/unassign
pub async fn unassign(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<MembershipRequest>,
) -> ApiResult {
    let employee_id = payload
        .employee_id
        .ok_or_else(|| ApiError::validation("Employee ID is required"))?;

    let team = TeamService::new(state.db.clone())
        .unassign(actor.org_id, team_id, employee_id)
        .await?;

    Ok(ApiResponse::message("Employee unassigned from team successfully").with_team_name(team.name))
}

/// GET /api/teams/employee/:employeeId/teams - which teams an employee
/// belongs to.
pub async fn employee_teams(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(employee_id): Path<Uuid>,
) -> ApiResult {
    let (employee, teams) = TeamService::new(state.db.clone())
        .teams_of(actor.org_id, employee_id)
        .await?;

    Ok(ApiResponse::success(json!({
        "employeeId": employee.id,
        "employeeName": employee.full_name(),
        "teams": teams,
    })))
}
