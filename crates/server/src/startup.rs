use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::auth::service::AuthConfig;
use service::Db;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Connect, migrate and assemble the application for `cfg`.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    common::env::ensure_frontend_dir(&cfg.web.frontend_dir).await?;

    let db = Db::connect(&cfg.database).await?;
    migration::Migrator::up(db.writer(), None)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!(replicas = db.replica_count(), "database ready");

    let state = AppState::new(db, AuthConfig::from(&cfg.auth), cfg.web.clone());
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: load configuration and run the HTTP server until Ctrl+C.
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting userfeedback server");
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}
