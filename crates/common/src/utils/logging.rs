use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset. SQL statements stay at warn
/// unless asked for; request spans come from `tower_http`.
pub const DEFAULT_DIRECTIVES: &str = "info,tower_http=info,sea_orm=warn,sqlx=warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Compact human-readable logs on stdout.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event. Targets are kept so the `server::errors`
/// envelope logs can be filtered downstream.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the output format from `LOG_FORMAT` (`json` or anything else).
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging_from_env() {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => init_logging_json(),
        _ => init_logging_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging_default();
        init_logging_from_env();
    }
}
