use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{verify_token, Claims};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Actor identity extracted from a verified credential and attached to the
/// request for downstream handlers. The claims are trusted as-is for the
/// lifetime of the token; no store lookup re-validates the actor.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            org_id: claims.org_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Access-control gate: rejects unauthenticated or malformed requests
/// before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)?;

    let claims = verify_token(&token, &state.config.security)
        .map_err(|_| ApiError::unauthenticated("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Declarative per-route capability requirement: the actor must be an
/// admin. Applied as a route layer inside the authentication gate.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let actor = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthenticated("No token provided"))?;

    if actor.role != Role::Admin {
        return Err(ApiError::forbidden("Access denied. Admin only."));
    }

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthenticated("No token provided"))?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthenticated("No token provided")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        assert!(extract_bearer(&headers_with("Basic dXNlcjpwdw==")).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(extract_bearer(&headers_with("Bearer ")).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer(&headers_with("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }
}
