use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::api::Patch;
use crate::database::models::{Employee, Team, TeamWithEmployees};
use crate::error::ApiError;

/// Tenant-scoped team store plus the employee/team membership join model.
pub struct TeamService {
    pool: PgPool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChanges {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

#[derive(Debug, FromRow)]
struct MembershipEmployeeRow {
    team_id: Uuid,
    #[sqlx(flatten)]
    employee: Employee,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, org_id: Uuid) -> Result<Vec<TeamWithEmployees>, ApiError> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE organisation_id = $1 ORDER BY created_at DESC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
        let mut employees_by_team = self.employees_for_teams(&ids).await?;

        Ok(teams
            .into_iter()
            .map(|team| {
                let employees = employees_by_team.remove(&team.id).unwrap_or_default();
                TeamWithEmployees { team, employees }
            })
            .collect())
    }

    pub async fn get(&self, org_id: Uuid, id: Uuid) -> Result<TeamWithEmployees, ApiError> {
        let team = self.find_team(org_id, id).await?;

        let mut employees_by_team = self.employees_for_teams(&[team.id]).await?;
        let employees = employees_by_team.remove(&team.id).unwrap_or_default();

        Ok(TeamWithEmployees { team, employees })
    }

    /// Create a team and assign its initial members atomically. If any
    /// supplied employee id is absent or belongs to another organisation the
    /// whole transaction rolls back; no partial team is left behind.
    pub async fn create_with_members(
        &self,
        org_id: Uuid,
        name: &str,
        description: Option<&str>,
        employee_ids: &[Uuid],
    ) -> Result<TeamWithEmployees, ApiError> {
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (organisation_id, name, description) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(org_id)
        .bind(name)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        let mut employees = Vec::new();
        if !employee_ids.is_empty() {
            // Batch ownership check: every requested id must resolve within
            // this organisation
            employees = sqlx::query_as::<_, Employee>(
                "SELECT * FROM employees WHERE id = ANY($1) AND organisation_id = $2",
            )
            .bind(employee_ids.to_vec())
            .bind(org_id)
            .fetch_all(&mut *tx)
            .await?;

            if employees.len() != employee_ids.len() {
                tx.rollback().await?;
                return Err(ApiError::validation(
                    "One or more employees not found or do not belong to your organisation",
                ));
            }

            for employee_id in employee_ids {
                sqlx::query("INSERT INTO employee_teams (employee_id, team_id) VALUES ($1, $2)")
                    .bind(employee_id)
                    .bind(team.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(TeamWithEmployees { team, employees })
    }

    pub async fn update(
        &self,
        org_id: Uuid,
        id: Uuid,
        changes: TeamChanges,
    ) -> Result<Team, ApiError> {
        match &changes.name {
            Patch::Null => return Err(ApiError::validation("name cannot be empty")),
            Patch::Value(v) if v.trim().is_empty() => {
                return Err(ApiError::validation("name cannot be empty"))
            }
            _ => {}
        }

        let mut qb = sqlx::QueryBuilder::new("UPDATE teams SET updated_at = now()");

        if let Patch::Value(v) = &changes.name {
            qb.push(", name = ").push_bind(v.clone());
        }
        match &changes.description {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", description = NULL");
            }
            Patch::Value(v) => {
                qb.push(", description = ").push_bind(v.clone());
            }
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND organisation_id = ")
            .push_bind(org_id)
            .push(" RETURNING *");

        qb.build_query_as::<Team>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Team not found"))
    }

    /// Delete a team and its membership rows. Returns the deleted team so
    /// the caller can surface its name.
    pub async fn delete(&self, org_id: Uuid, id: Uuid) -> Result<Team, ApiError> {
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;

        sqlx::query("DELETE FROM employee_teams WHERE team_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(team)
    }

    /// Assign an employee to a team. Both sides must belong to the
    /// organisation; an existing pair is a conflict.
    pub async fn assign(
        &self,
        org_id: Uuid,
        team_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Team, ApiError> {
        let team = self.find_team(org_id, team_id).await?;

        let employee_exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employees WHERE id = $1 AND organisation_id = $2",
        )
        .bind(employee_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        if employee_exists.is_none() {
            return Err(ApiError::not_found("Employee not found"));
        }

        let already_assigned = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employee_teams WHERE employee_id = $1 AND team_id = $2",
        )
        .bind(employee_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        if already_assigned.is_some() {
            return Err(ApiError::conflict("Employee is already assigned to this team"));
        }

        // The unique (employee_id, team_id) constraint closes the race
        // between the check above and this insert
        sqlx::query("INSERT INTO employee_teams (employee_id, team_id) VALUES ($1, $2)")
            .bind(employee_id)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => {
                    ApiError::conflict("Employee is already assigned to this team")
                }
                other => other,
            })?;

        Ok(team)
    }

    pub async fn unassign(
        &self,
        org_id: Uuid,
        team_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Team, ApiError> {
        let team = self.find_team(org_id, team_id).await?;

        let deleted = sqlx::query("DELETE FROM employee_teams WHERE employee_id = $1 AND team_id = $2")
            .bind(employee_id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found("Employee is not assigned to this team"));
        }

        Ok(team)
    }

    /// Teams an employee (verified to belong to the organisation) is
    /// assigned to.
    pub async fn teams_of(
        &self,
        org_id: Uuid,
        employee_id: Uuid,
    ) -> Result<(Employee, Vec<Team>), ApiError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE id = $1 AND organisation_id = $2",
        )
        .bind(employee_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

        let teams = sqlx::query_as::<_, Team>(
            "SELECT t.* FROM teams t \
             JOIN employee_teams et ON et.team_id = t.id \
             WHERE et.employee_id = $1",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((employee, teams))
    }

    async fn find_team(&self, org_id: Uuid, id: Uuid) -> Result<Team, ApiError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Team not found"))
    }

    async fn employees_for_teams(
        &self,
        team_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Employee>>, ApiError> {
        if team_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, MembershipEmployeeRow>(
            "SELECT et.team_id, e.id, e.organisation_id, e.first_name, e.last_name, \
                    e.email, e.phone, e.position, e.department, e.created_at, e.updated_at \
             FROM employee_teams et \
             JOIN employees e ON e.id = et.employee_id \
             WHERE et.team_id = ANY($1)",
        )
        .bind(team_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Employee>> = HashMap::new();
        for row in rows {
            grouped.entry(row.team_id).or_default().push(row.employee);
        }
        Ok(grouped)
    }
}
