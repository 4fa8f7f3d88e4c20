//! Printgate Server Binary
//!
//! Loads configuration, connects the pools, and serves the JSON API with
//! graceful shutdown on SIGINT/SIGTERM.

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use printgate::logging::init_structured_logging;
use printgate::web::{build_router, state::AppState};
use printgate::PrintgateConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = PrintgateConfig::load().context("failed to load configuration")?;
    let bind_address = config.web.bind_address.clone();

    let state = AppState::from_config(config)
        .await
        .context("failed to assemble application state")?;
    let router = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!(bind_address = %bind_address, "printgate server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("printgate server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
