use axum::{extract::State, Extension};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::Query;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{LogQuery, LogService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListQuery {
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/logs - tenant-scoped audit trail, admin only (enforced by the
/// route's capability layer).
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Query(query): Query<LogListQuery>,
) -> ApiResult {
    let start_date = query.start_date.as_deref().map(parse_date).transpose()?;
    let end_date = query.end_date.as_deref().map(parse_date).transpose()?;

    let logs = LogService::new(state.db.clone())
        .list(
            actor.org_id,
            LogQuery {
                action: query.action,
                user_id: query.user_id,
                start_date,
                end_date,
                limit: query.limit,
            },
        )
        .await?;

    Ok(ApiResponse::success(logs))
}

/// Accepts RFC 3339 timestamps or bare dates (interpreted as UTC midnight).
fn parse_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = value.parse::<NaiveDate>() {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    Err(ApiError::validation(format!("Invalid date: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_date("2026-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let dt = parse_date("2026-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("not-a-date").is_err());
    }
}
