use configs::WebConfig;
use service::auth::service::AuthConfig;
use service::Db;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AuthConfig,
    pub web: WebConfig,
}

impl AppState {
    pub fn new(db: Db, auth: AuthConfig, web: WebConfig) -> Self {
        Self { db, auth, web }
    }
}
