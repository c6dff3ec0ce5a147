use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};

fn init_logging() {
    // load .env first so RUST_LOG / LOG_FORMAT apply
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "userfeedback", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    init_logging();

    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "userfeedback", event = "panic", pid, message = %info, "unhandled panic occurred");
    }));

    // config.toml first, then TOKIO_WORKER_THREADS
    let worker_threads = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()),
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "userfeedback", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "userfeedback",
        event = "start",
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "userfeedback server starting"
    );

    // server::run drains in-flight requests on Ctrl+C before returning
    rt.block_on(async move {
        match tokio::spawn(server::run()).await {
            Ok(Ok(())) => {
                info!(service = "userfeedback", event = "stop", pid, "server stopped");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(service = "userfeedback", event = "run_failed", error = %e, "server::run returned error");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(service = "userfeedback", event = "task_join_error", error = %e, "server task join error");
                ExitCode::FAILURE
            }
        }
    })
}
