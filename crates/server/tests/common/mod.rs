#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use configs::WebConfig;
use server::routes;
use server::state::AppState;
use service::auth::service::AuthConfig;
use service::Db;

pub const JWT_SECRET: &str = "test-secret";

pub fn auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: JWT_SECRET.into(), token_ttl_hours: 12 }
}

/// Frontend bundle stand-in with an `index.html` and one asset.
pub fn frontend_dir(name: &str) -> anyhow::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("userfeedback-{name}-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("assets"))?;
    std::fs::write(dir.join("index.html"), "<html>userfeedback</html>")?;
    std::fs::write(dir.join("assets/app.css"), "body{}")?;
    Ok(dir)
}

/// Router over a fresh, migrated in-memory SQLite database.
pub async fn test_app() -> anyhow::Result<Router> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(opt).await?;
    migration::Migrator::up(&conn, None).await?;

    let web = WebConfig { frontend_dir: frontend_dir("api")?.to_string_lossy().into_owned(), ..Default::default() };
    let state = AppState::new(Db::single(conn), auth_config(), web);
    Ok(routes::build_router(state, CorsLayer::very_permissive()))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: header::HeaderName) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> anyhow::Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    let req = match body {
        Some(v) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(v.to_string()))?,
        None => builder.body(Body::empty())?,
    };
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await?.to_vec();
    Ok(TestResponse { status, headers, bytes })
}

/// Authenticated JSON call.
pub async fn call(app: &Router, method: Method, uri: &str, token: &str, body: Option<Value>) -> anyhow::Result<TestResponse> {
    let bearer = format!("Bearer {token}");
    send(app, method, uri, &[("authorization", bearer.as_str())], body).await
}

pub struct Seed {
    pub token: String,
    pub tenant_id: i64,
    pub project_id: i64,
    pub channel_id: i64,
    pub api_key: String,
}

pub async fn setup_tenant(app: &Router, site: &str, email: &str) -> anyhow::Result<(i64, String)> {
    let res = send(
        app,
        Method::POST,
        "/api/tenants",
        &[],
        Some(json!({ "siteName": site, "email": email, "password": "Passw0rd!" })),
    )
    .await?;
    anyhow::ensure!(res.status == StatusCode::OK, "tenant setup failed: {:?}", res.json());
    let tenant_id = res.json()["id"].as_i64().unwrap_or_default();

    let res = send(app, Method::POST, "/api/auth/sign-in", &[], Some(json!({ "email": email, "password": "Passw0rd!" }))).await?;
    anyhow::ensure!(res.status == StatusCode::OK, "sign-in failed: {:?}", res.json());
    let token = res.json()["accessToken"].as_str().unwrap_or_default().to_string();
    Ok((tenant_id, token))
}

/// Tenant, admin session, project `web`, channel `app` and an API key.
pub async fn seed(app: &Router) -> anyhow::Result<Seed> {
    let (tenant_id, token) = setup_tenant(app, "acme", "admin@acme.io").await?;

    let res = call(app, Method::POST, "/api/projects", &token, Some(json!({ "tenantId": tenant_id, "name": "web" }))).await?;
    anyhow::ensure!(res.status == StatusCode::OK, "project create failed: {:?}", res.json());
    let project_id = res.json()["id"].as_i64().unwrap_or_default();

    let channel = json!({
        "name": "app",
        "fields": [
            { "key": "message", "name": "Message", "format": "text", "type": "API" },
            { "key": "device", "name": "Device", "format": "keyword", "type": "API" },
            { "key": "memo", "name": "Memo", "format": "text", "type": "ADMIN" }
        ]
    });
    let res = call(app, Method::POST, &format!("/api/projects/{project_id}/channels"), &token, Some(channel)).await?;
    anyhow::ensure!(res.status == StatusCode::OK, "channel create failed: {:?}", res.json());
    let channel_id = res.json()["id"].as_i64().unwrap_or_default();

    let res = call(app, Method::POST, &format!("/api/projects/{project_id}/api-keys"), &token, None).await?;
    anyhow::ensure!(res.status == StatusCode::OK, "api key create failed: {:?}", res.json());
    let api_key = res.json()["value"].as_str().unwrap_or_default().to_string();

    Ok(Seed { token, tenant_id, project_id, channel_id, api_key })
}

pub async fn post_feedback(app: &Router, seed: &Seed, body: Value) -> anyhow::Result<TestResponse> {
    let uri = format!("/api/projects/{}/channels/{}/feedbacks", seed.project_id, seed.channel_id);
    send(app, Method::POST, &uri, &[("x-api-key", seed.api_key.as_str())], Some(body)).await
}
