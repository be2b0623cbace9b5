use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::models::{Log, LogUser, LogWithUser};
use crate::error::ApiError;

/// Append-only audit trail recorder and (admin-only) reader.
pub struct LogService {
    pool: PgPool,
}

#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct LogRow {
    #[sqlx(flatten)]
    log: Log,
    user_name: Option<String>,
    user_email: Option<String>,
}

const DEFAULT_LIMIT: i64 = 100;

impl LogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one audit entry. Failures are swallowed: audit recording must
    /// never abort the business operation that triggered it, so errors only
    /// reach operational diagnostics.
    pub async fn record(&self, org_id: Uuid, user_id: Option<Uuid>, action: &str, meta: Value) {
        let result = sqlx::query(
            "INSERT INTO logs (organisation_id, user_id, action, meta) VALUES ($1, $2, $3, $4)",
        )
        .bind(org_id)
        .bind(user_id)
        .bind(action)
        .bind(meta)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(action, "failed to record audit log entry: {}", e);
        }
    }

    /// Tenant-scoped log listing, newest first, with the acting user
    /// resolved where it still exists.
    pub async fn list(&self, org_id: Uuid, query: LogQuery) -> Result<Vec<LogWithUser>, ApiError> {
        let mut qb = sqlx::QueryBuilder::new(
            "SELECT l.id, l.organisation_id, l.user_id, l.action, l.meta, l.timestamp, \
                    u.name AS user_name, u.email AS user_email \
             FROM logs l \
             LEFT JOIN users u ON u.id = l.user_id \
             WHERE l.organisation_id = ",
        );
        qb.push_bind(org_id);

        if let Some(action) = &query.action {
            qb.push(" AND l.action = ").push_bind(action.clone());
        }
        if let Some(user_id) = query.user_id {
            qb.push(" AND l.user_id = ").push_bind(user_id);
        }
        if let Some(start) = query.start_date {
            qb.push(" AND l.timestamp >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            qb.push(" AND l.timestamp <= ").push_bind(end);
        }

        qb.push(" ORDER BY l.timestamp DESC LIMIT ")
            .push_bind(query.limit.unwrap_or(DEFAULT_LIMIT).max(0));

        let rows = qb.build_query_as::<LogRow>().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = match (row.log.user_id, row.user_name, row.user_email) {
                    (Some(id), Some(name), Some(email)) => Some(LogUser { id, name, email }),
                    _ => None,
                };
                LogWithUser { log: row.log, user }
            })
            .collect())
    }
}
