use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One audit-trail entry. Append-only; never updated or deleted by the
/// application. `user_id` is nullable so entries survive user deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub meta: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Log entry with the acting user resolved, for the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWithUser {
    #[serde(flatten)]
    pub log: Log,
    pub user: Option<LogUser>,
}
