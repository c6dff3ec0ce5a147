//! Environment/runtime helpers
//!
//! Sanity checks on directories the server expects at startup.

use tracing::warn;

/// Warn when the frontend asset directory is missing; the web gate still
/// answers redirects but passing requests will 404.
pub async fn ensure_frontend_dir(frontend_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend assets directory not found; static pages may 404");
    }
    Ok(())
}
