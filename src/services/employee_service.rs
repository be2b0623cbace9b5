use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::api::{is_valid_email, Patch};
use crate::database::models::{Employee, EmployeeWithTeams, Team};
use crate::error::ApiError;

/// Tenant-scoped employee store. Every statement filters on the caller's
/// organisation id; a lookup by id alone would be a cross-tenant leak.
pub struct EmployeeService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

/// Partial update: `Missing` fields retain their previous value, `Null`
/// clears an optional field, and required fields reject empty values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeChanges {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub phone: Patch<String>,
    #[serde(default)]
    pub position: Patch<String>,
    #[serde(default)]
    pub department: Patch<String>,
}

#[derive(Debug, FromRow)]
struct MembershipTeamRow {
    employee_id: Uuid,
    #[sqlx(flatten)]
    team: Team,
}

impl EmployeeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, org_id: Uuid) -> Result<Vec<EmployeeWithTeams>, ApiError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE organisation_id = $1 ORDER BY created_at DESC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
        let mut teams_by_employee = self.teams_for_employees(&ids).await?;

        Ok(employees
            .into_iter()
            .map(|employee| {
                let teams = teams_by_employee.remove(&employee.id).unwrap_or_default();
                EmployeeWithTeams { employee, teams }
            })
            .collect())
    }

    pub async fn get(&self, org_id: Uuid, id: Uuid) -> Result<EmployeeWithTeams, ApiError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

        let mut teams_by_employee = self.teams_for_employees(&[employee.id]).await?;
        let teams = teams_by_employee.remove(&employee.id).unwrap_or_default();

        Ok(EmployeeWithTeams { employee, teams })
    }

    pub async fn create(&self, org_id: Uuid, new: NewEmployee) -> Result<Employee, ApiError> {
        if !is_valid_email(&new.email) {
            return Err(ApiError::validation("Invalid email address"));
        }

        let employee = sqlx::query_as::<_, Employee>(
            "INSERT INTO employees (organisation_id, first_name, last_name, email, phone, position, department) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(org_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.position)
        .bind(&new.department)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn update(
        &self,
        org_id: Uuid,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> Result<Employee, ApiError> {
        validate_changes(&changes)?;

        let mut qb = sqlx::QueryBuilder::new("UPDATE employees SET updated_at = now()");

        if let Patch::Value(v) = &changes.first_name {
            qb.push(", first_name = ").push_bind(v.clone());
        }
        if let Patch::Value(v) = &changes.last_name {
            qb.push(", last_name = ").push_bind(v.clone());
        }
        if let Patch::Value(v) = &changes.email {
            qb.push(", email = ").push_bind(v.clone());
        }
        push_optional(&mut qb, "phone", &changes.phone);
        push_optional(&mut qb, "position", &changes.position);
        push_optional(&mut qb, "department", &changes.department);

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND organisation_id = ")
            .push_bind(org_id)
            .push(" RETURNING *");

        qb.build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee not found"))
    }

    pub async fn delete(&self, org_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employees WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            return Err(ApiError::not_found("Employee not found"));
        }

        // Membership rows go with the employee, explicitly, in the same
        // transaction
        sqlx::query("DELETE FROM employee_teams WHERE employee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM employees WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(org_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Teams for a batch of employees, grouped by employee id. One query,
    /// not one per employee.
    async fn teams_for_employees(
        &self,
        employee_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Team>>, ApiError> {
        if employee_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, MembershipTeamRow>(
            "SELECT et.employee_id, t.id, t.organisation_id, t.name, t.description, \
                    t.created_at, t.updated_at \
             FROM employee_teams et \
             JOIN teams t ON t.id = et.team_id \
             WHERE et.employee_id = ANY($1)",
        )
        .bind(employee_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Team>> = HashMap::new();
        for row in rows {
            grouped.entry(row.employee_id).or_default().push(row.team);
        }
        Ok(grouped)
    }
}

fn push_optional(qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, column: &str, patch: &Patch<String>) {
    match patch {
        Patch::Missing => {}
        Patch::Null => {
            qb.push(format!(", {} = NULL", column));
        }
        Patch::Value(v) => {
            qb.push(format!(", {} = ", column)).push_bind(v.clone());
        }
    }
}

fn validate_changes(changes: &EmployeeChanges) -> Result<(), ApiError> {
    for (field, patch) in [
        ("firstName", &changes.first_name),
        ("lastName", &changes.last_name),
        ("email", &changes.email),
    ] {
        match patch {
            Patch::Null => {
                return Err(ApiError::validation(format!("{} cannot be empty", field)));
            }
            Patch::Value(v) if v.trim().is_empty() => {
                return Err(ApiError::validation(format!("{} cannot be empty", field)));
            }
            _ => {}
        }
    }

    if let Patch::Value(email) = &changes.email {
        if !is_valid_email(email) {
            return Err(ApiError::validation("Invalid email address"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_field_is_rejected() {
        let changes = EmployeeChanges {
            first_name: Patch::Value("".to_string()),
            ..Default::default()
        };
        assert!(validate_changes(&changes).is_err());
    }

    #[test]
    fn null_required_field_is_rejected() {
        let changes = EmployeeChanges {
            email: Patch::Null,
            ..Default::default()
        };
        assert!(validate_changes(&changes).is_err());
    }

    #[test]
    fn missing_fields_pass_validation() {
        assert!(validate_changes(&EmployeeChanges::default()).is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let changes = EmployeeChanges {
            email: Patch::Value("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(validate_changes(&changes).is_err());
    }
}
