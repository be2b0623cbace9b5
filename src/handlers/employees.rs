use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{Json, Path};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{EmployeeChanges, EmployeeService, NewEmployee};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

/// GET /api/employees - all employees in the caller's organisation, newest
/// first, with team memberships embedded.
pub async fn list(State(state): State<AppState>, Extension(actor): Extension<AuthUser>) -> ApiResult {
    let employees = EmployeeService::new(state.db.clone()).list(actor.org_id).await?;
    Ok(ApiResponse::success(employees))
}

/// GET /api/employees/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let employee = EmployeeService::new(state.db.clone()).get(actor.org_id, id).await?;
    Ok(ApiResponse::success(employee))
}

/// POST /api/employees
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> ApiResult {
    let (first_name, last_name, email) = match (
        payload.first_name.filter(|v| !v.trim().is_empty()),
        payload.last_name.filter(|v| !v.trim().is_empty()),
        payload.email.filter(|v| !v.trim().is_empty()),
    ) {
        (Some(f), Some(l), Some(e)) => (f, l, e),
        _ => {
            return Err(ApiError::validation(
                "First name, last name, and email are required",
            ))
        }
    };

    let employee = EmployeeService::new(state.db.clone())
        .create(
            actor.org_id,
            NewEmployee {
                first_name,
                last_name,
                email,
                phone: payload.phone,
                position: payload.position,
                department: payload.department,
            },
        )
        .await?;

    Ok(ApiResponse::created(employee).with_message("Employee created successfully"))
}

/// PUT /api/employees/:id - partial update; absent fields keep their
/// previous values.
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<EmployeeChanges>,
) -> ApiResult {
    let employee = EmployeeService::new(state.db.clone())
        .update(actor.org_id, id, changes)
        .await?;
    Ok(ApiResponse::success(employee).with_message("Employee updated successfully"))
}

/// DELETE /api/employees/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult {
    EmployeeService::new(state.db.clone()).delete(actor.org_id, id).await?;
    Ok(ApiResponse::message("Employee deleted successfully"))
}
