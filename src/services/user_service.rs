use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::api::{is_valid_email, Patch};
use crate::database::models::{Organisation, Profile, ProfileOrganisation, Role, User};
use crate::error::ApiError;

pub struct UserService {
    pool: PgPool,
}

/// User joined with its organisation name, as needed by login.
#[derive(Debug, FromRow)]
pub struct UserWithOrg {
    #[sqlx(flatten)]
    pub user: User,
    pub organisation_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Create the organisation and its first (admin) user in one
    /// transaction.
    pub async fn register_organisation(
        &self,
        org_name: &str,
        admin_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(Organisation, User), ApiError> {
        let mut tx = self.pool.begin().await?;

        let organisation = sqlx::query_as::<_, Organisation>(
            "INSERT INTO organisations (name) VALUES ($1) RETURNING *",
        )
        .bind(org_name)
        .fetch_one(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (organisation_id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(organisation.id)
        .bind(admin_name)
        .bind(email)
        .bind(password_hash)
        .bind(Role::Admin)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("User with this email already exists"),
            other => other,
        })?;

        tx.commit().await?;
        Ok((organisation, user))
    }

    pub async fn find_for_login(&self, email: &str) -> Result<Option<UserWithOrg>, ApiError> {
        let row = sqlx::query_as::<_, UserWithOrg>(
            "SELECT u.*, o.name AS organisation_name \
             FROM users u \
             JOIN organisations o ON o.id = u.organisation_id \
             WHERE u.email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Profile, ApiError> {
        let row = sqlx::query_as::<_, UserWithOrg>(
            "SELECT u.*, o.name AS organisation_name \
             FROM users u \
             JOIN organisations o ON o.id = u.organisation_id \
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

        Ok(Profile {
            id: row.user.id,
            name: row.user.name,
            email: row.user.email,
            organisation: ProfileOrganisation {
                id: row.user.organisation_id,
                name: row.organisation_name,
            },
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, ApiError> {
        for (field, patch) in [("name", &changes.name), ("email", &changes.email)] {
            match patch {
                Patch::Null => {
                    return Err(ApiError::validation(format!("{} cannot be empty", field)))
                }
                Patch::Value(v) if v.trim().is_empty() => {
                    return Err(ApiError::validation(format!("{} cannot be empty", field)))
                }
                _ => {}
            }
        }

        if let Patch::Value(email) = &changes.email {
            if !is_valid_email(email) {
                return Err(ApiError::validation("Invalid email address"));
            }

            // Reject an email already owned by another user before hitting
            // the unique index, so the message stays friendly
            let taken: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id <> $2")
                    .bind(email)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if taken.is_some() {
                return Err(ApiError::conflict("Email is already in use"));
            }
        }

        let mut qb = sqlx::QueryBuilder::new("UPDATE users SET updated_at = now()");

        if let Patch::Value(v) = &changes.name {
            qb.push(", name = ").push_bind(v.clone());
        }
        if let Patch::Value(v) = &changes.email {
            qb.push(", email = ").push_bind(v.clone());
        }

        qb.push(" WHERE id = ").push_bind(user_id).push(" RETURNING *");

        qb.build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => ApiError::conflict("Email is already in use"),
                other => other,
            })?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}
