//! Connection set: one primary for writes, optional replicas for reads.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use configs::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

#[derive(Clone)]
pub struct Db {
    primary: DatabaseConnection,
    replicas: Arc<Vec<DatabaseConnection>>,
    cursor: Arc<AtomicUsize>,
}

impl Db {
    pub fn new(primary: DatabaseConnection, replicas: Vec<DatabaseConnection>) -> Self {
        Self { primary, replicas: Arc::new(replicas), cursor: Arc::new(AtomicUsize::new(0)) }
    }

    /// Single connection used for both reads and writes.
    pub fn single(primary: DatabaseConnection) -> Self {
        Self::new(primary, Vec::new())
    }

    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let primary = Database::connect(options(cfg, &cfg.primary_url)).await?;
        let mut replicas = Vec::with_capacity(cfg.secondary_urls.len());
        for url in &cfg.secondary_urls {
            replicas.push(Database::connect(options(cfg, url)).await?);
        }
        info!(replicas = replicas.len(), "database connections established");
        Ok(Self::new(primary, replicas))
    }

    pub fn writer(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Round-robin over replicas; falls back to the primary.
    pub fn reader(&self) -> &DatabaseConnection {
        if self.replicas.is_empty() {
            return &self.primary;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.replicas.len();
        &self.replicas[idx]
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}

fn options(cfg: &DatabaseConfig, url: &str) -> ConnectOptions {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    opt
}
