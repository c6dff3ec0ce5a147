//! Request guards: the signed-in user (bearer token or `auth_token` cookie)
//! and the project API key used by feedback intake.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::{header, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use models::api_key;
use models::role::Permission;
use models::user::UserType;
use service::auth::domain::Claims;
use service::auth::service::verify_token;
use service::permission::{self, Principal};
use service::{api_key_service, ServiceError};

use crate::errors::ApiError;
use crate::state::AppState;

pub use common::types::{API_KEY_HEADER, AUTH_COOKIE};

fn unauthorized(msg: &str) -> ApiError {
    ApiError(ServiceError::Unauthorized(msg.to_string()))
}

/// Bearer token from `Authorization`, falling back to the session cookie.
pub fn session_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| unauthorized("Invalid authorization header"))?;
        return match raw.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => {
                warn!(path = %parts.uri.path(), "invalid Authorization format (expect Bearer)");
                Err(unauthorized("Invalid authorization header"))
            }
        };
    }
    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Signed-in caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claims: Claims,
    pub principal: Principal,
}

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.principal.user_id
    }

    /// Fails with `Forbidden` unless the caller holds `permission` in the project.
    pub async fn require(&self, state: &AppState, project_id: i32, permission: Permission) -> Result<(), ApiError> {
        permission::require(&state.db, &self.principal, project_id, permission).await?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)?.ok_or_else(|| unauthorized("Unauthorized"))?;
        let claims = verify_token(&state.auth.jwt_secret, &token).map_err(|e| {
            warn!(path = %parts.uri.path(), err = %e, "token validation failed");
            unauthorized("Unauthorized")
        })?;
        let user_id = claims.user_id().ok_or_else(|| unauthorized("Unauthorized"))?;
        let user_type: UserType = claims.typ.parse().map_err(|_| unauthorized("Unauthorized"))?;
        let principal = Principal { user_id, tenant_id: claims.tid, user_type };
        Ok(CurrentUser { claims, principal })
    }
}

/// Active API key of the project named by the `projectId` path parameter.
#[derive(Debug, Clone)]
pub struct ProjectApiKey(pub api_key::Model);

#[async_trait]
impl FromRequestParts<AppState> for ProjectApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError(ServiceError::bad_request(e.body_text())))?;
        let project_id = params
            .get("projectId")
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| ApiError(ServiceError::bad_request("Invalid project id")))?;
        let value = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| unauthorized("API key is required"))?;
        let key = api_key_service::verify(&state.db, project_id, value).await?;
        Ok(ProjectApiKey(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(build: impl FnOnce(axum::http::request::Builder) -> axum::http::request::Builder) -> Parts {
        let (parts, _) = build(Request::builder().uri("/api/x")).body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let p = parts(|b| b.header("authorization", "Bearer abc").header("cookie", "auth_token=zzz"));
        assert_eq!(session_token(&p).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let p = parts(|b| b.header("cookie", "NEXT_LOCALE=ko; auth_token=zzz"));
        assert_eq!(session_token(&p).unwrap().as_deref(), Some("zzz"));
    }

    #[test]
    fn malformed_authorization_is_rejected() {
        let p = parts(|b| b.header("authorization", "Basic abc"));
        assert!(session_token(&p).is_err());
        let p = parts(|b| b);
        assert_eq!(session_token(&p).unwrap(), None);
    }
}
