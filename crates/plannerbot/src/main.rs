//! Plannerbot entry point.
//!
//! Parses configuration, initializes the database and services, starts the
//! background session sweep, and long-polls Telegram until shutdown.

mod config;
mod handlers;
mod poller;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plannerbot_core::session::sweep::SweepTask;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Set up tracing based on verbosity
    let filter = match config.verbose {
        0 if config.quiet => "error",
        0 => "info",
        1 => "info,plannerbot=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    info!(bot_name = %config.bot_name, "starting bot");

    // Initialize application state (DB, repositories, transport)
    let state = AppState::init(&config).await?;

    // Start the background session sweep
    let sweep_token = CancellationToken::new();
    let sweep_handle = SweepTask::new(
        state.lifecycle.clone(),
        Duration::from_secs(config.sweep_interval_secs),
        sweep_token.clone(),
    )
    .spawn();

    tokio::select! {
        _ = poller::run(&state) => {}
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    // Stop the sweep and let the current tick drain
    sweep_token.cancel();
    let _ = sweep_handle.await;

    info!("bot stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
