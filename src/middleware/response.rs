use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope builder: `{success: true, message?, data?, teamName?}`.
///
/// `teamName` rides at the top level (not inside `data`) so the audit stage
/// can pick it up for action-tag interpolation without a second lookup.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    message: Option<String>,
    data: Option<Value>,
    team_name: Option<String>,
}

impl ApiResponse {
    pub fn success(data: impl Serialize) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            data: Some(to_value(data)),
            team_name: None,
        }
    }

    pub fn created(data: impl Serialize) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// Message-only response, no data payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: Some(message.into()),
            data: None,
            team_name: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }
}

fn to_value(data: impl Serialize) -> Value {
    serde_json::to_value(data).unwrap_or_else(|e| {
        tracing::error!("failed to serialize response data: {}", e);
        Value::Null
    })
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut body = Map::new();
        body.insert("success".to_string(), json!(true));
        if let Some(message) = self.message {
            body.insert("message".to_string(), json!(message));
        }
        if let Some(data) = self.data {
            body.insert("data".to_string(), data);
        }
        if let Some(team_name) = self.team_name {
            body.insert("teamName".to_string(), json!(team_name));
        }

        (self.status, Json(Value::Object(body))).into_response()
    }
}

/// Handler result alias: success envelope or taxonomy error.
pub type ApiResult = Result<ApiResponse, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_orders_fields() {
        let response = ApiResponse::created(json!({"id": 1}))
            .with_message("Team created successfully")
            .with_team_name("Eng");

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.message.as_deref(), Some("Team created successfully"));
        assert_eq!(response.team_name.as_deref(), Some("Eng"));
    }

    #[test]
    fn message_only_has_no_data() {
        let response = ApiResponse::message("Employee deleted successfully");
        assert!(response.data.is_none());
        assert_eq!(response.status, StatusCode::OK);
    }
}
