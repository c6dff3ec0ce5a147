//! Frontend request gate: session and locale redirects in front of the
//! static web app.
//!
//! Classification runs on the path with its locale prefix removed. A valid
//! `auth_token` session is sent away from public pages to `/main`, a missing
//! one away from `/main…` to the sign-in page, and paths without a locale
//! get the `NEXT_LOCALE` cookie (or the default locale) prepended.

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error};

use common::types::{AUTH_COOKIE, LOCALE_COOKIE};
use configs::WebConfig;
use service::auth::service::verify_token;

use crate::state::AppState;

/// Prefixes served without any gating.
pub const EXCLUDED_PREFIXES: [&str; 6] = ["/api", "/_next/static", "/_next/image", "/favicon.ico", "/fonts", "/assets"];
pub const MAIN_PATH: &str = "/main";
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

/// What the gate needs to know about a request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub has_session: bool,
    pub locale_cookie: Option<&'a str>,
}

pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p))
}

pub fn is_error_page(path: &str) -> bool {
    path.starts_with("/error")
}

pub fn is_protected(path: &str) -> bool {
    path.starts_with(MAIN_PATH)
}

/// Split a leading configured locale segment off `path`.
pub fn split_locale<'a>(path: &'a str, locales: &[String]) -> (Option<&'a str>, &'a str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, "/"),
    };
    if locales.iter().any(|l| l == first) {
        (Some(first), rest)
    } else {
        (None, path)
    }
}

fn localized(locale: Option<&str>, path: &str) -> String {
    match locale {
        Some(l) => format!("/{l}{path}"),
        None => path.to_string(),
    }
}

pub fn decide(cfg: &WebConfig, req: GateRequest<'_>) -> GateDecision {
    if is_excluded(req.path) {
        return GateDecision::Pass;
    }
    let (locale, bare) = split_locale(req.path, &cfg.locales);
    if is_error_page(bare) {
        return GateDecision::Pass;
    }

    let protected = is_protected(bare);
    if req.has_session && !protected {
        return GateDecision::Redirect(localized(locale, MAIN_PATH));
    }
    if !req.has_session && protected {
        return GateDecision::Redirect(localized(locale, SIGN_IN_PATH));
    }

    if locale.is_none() {
        let chosen = req
            .locale_cookie
            .filter(|c| cfg.locales.iter().any(|l| l == c))
            .unwrap_or(cfg.default_locale.as_str());
        let search = req.query.map(|q| format!("?{q}")).unwrap_or_default();
        return GateDecision::Redirect(format!("/{chosen}{}{search}", req.path));
    }
    GateDecision::Pass
}

/// Router fallback: gate the request, then serve the frontend bundle with
/// `index.html` for client-side routes.
pub async fn frontend(State(state): State<AppState>, req: Request) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let has_session = jar
        .get(AUTH_COOKIE)
        .map(|c| verify_token(&state.auth.jwt_secret, c.value()).is_ok())
        .unwrap_or(false);
    let decision = decide(
        &state.web,
        GateRequest {
            path: req.uri().path(),
            query: req.uri().query(),
            has_session,
            locale_cookie: jar.get(LOCALE_COOKIE).map(|c| c.value()),
        },
    );

    match decision {
        GateDecision::Redirect(to) => {
            debug!(from = %req.uri(), to = %to, "web gate redirect");
            Redirect::temporary(&to).into_response()
        }
        GateDecision::Pass => {
            let dir = &state.web.frontend_dir;
            let index = format!("{dir}/index.html");
            match ServeDir::new(dir).fallback(ServeFile::new(index)).oneshot(req).await {
                Ok(res) => res.into_response(),
                Err(e) => {
                    error!(err = %e, "static file serving failed");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    }
}
