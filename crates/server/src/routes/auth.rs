use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::info;

use service::auth::domain::SignInInput;
use service::auth::repo::SeaOrmAuthRepository;
use service::auth::AuthService;

use crate::errors::ApiError;
use crate::extract::{CurrentUser, AUTH_COOKIE};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutput {
    pub access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeOutput {
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub user_type: String,
}

#[utoipa::path(post, path = "/api/auth/sign-in", tag = "auth", request_body = crate::openapi::SignInRequest, responses((status = 200, description = "Signed in", body = crate::openapi::SignInResponse), (status = 401, description = "Unauthorized")))]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<SignInInput>,
) -> Result<(CookieJar, Json<SignInOutput>), ApiError> {
    let repo = Arc::new(SeaOrmAuthRepository { db: state.db.clone() });
    let svc = AuthService::new(repo, state.auth.clone());
    let session = svc.sign_in(input).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.access_token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    info!(user_id = session.user.id, "session cookie issued");
    Ok((jar.add(cookie), Json(SignInOutput { access_token: session.access_token })))
}

#[utoipa::path(post, path = "/api/auth/sign-out", tag = "auth", responses((status = 204, description = "Signed out")))]
pub async fn sign_out(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(user: CurrentUser) -> Json<MeOutput> {
    Json(MeOutput {
        id: user.id(),
        tenant_id: user.claims.tid,
        email: user.claims.email,
        user_type: user.claims.typ,
    })
}
