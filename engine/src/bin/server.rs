use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use iat::env_config::{init_base_path, Config};
use iat::recorder::{CsvResultLog, SharedRecorder};
use iat::server::{create_router, AppContext};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_base_path(&config) {
        tracing::error!(error = %e, "cannot enter base path");
        return ExitCode::FAILURE;
    }

    let catalog = match config.load_catalog() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid stimulus catalog");
            return ExitCode::FAILURE;
        }
    };

    let log = match CsvResultLog::open(&config.results_path) {
        Ok(log) => log,
        Err(e) => {
            tracing::error!(
                error = %e,
                path = %config.results_path.display(),
                "cannot open result log"
            );
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(path = %log.path().display(), words = catalog.len(), "result log ready");

    let results_log = log.path().to_path_buf();
    let ctx = AppContext::new(
        catalog,
        config.keys.clone(),
        config.seed,
        SharedRecorder::new(log),
    )
    .with_results_log(results_log);
    let ctx = Arc::new(ctx);
    let app = create_router(ctx);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "cannot bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(port = config.port, "IAT server running, press Ctrl+C to stop");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
