//! depthscope - live order book depth and RSI monitor
//!
//! Streams depth deltas and aggregate trades for one Binance instrument,
//! keeps the book in memory, and renders it alongside an RSI signal.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use depthscope::presenter::{restore_terminal, run_headless, run_terminal};
use depthscope::{health, AppState, Config, WebSocketManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    info!("Starting depthscope");
    info!(
        symbol = %config.symbol,
        depth = config.depth_levels,
        rsi_periods = config.rsi_periods,
        headless = config.headless,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(config)?);

    // Start health check server
    let health_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_state).await {
            warn!(error = %e, "Health server error");
        }
    });

    // Ingestion runs on its own task; when it gives up the presenter keeps
    // showing the last known book.
    let ingest_state = state.clone();
    tokio::spawn(async move {
        let mut ws_manager = WebSocketManager::new(ingest_state);
        if let Err(e) = ws_manager.run().await {
            error!(error = %e, "Stream ingestion stopped");
        }
    });

    let run_for = state.config.run_for_secs.map(Duration::from_secs);
    let deadline = async move {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    let presenter = async {
        if state.config.headless {
            run_headless(state.clone()).await
        } else {
            run_terminal(state.clone()).await
        }
    };

    let outcome = tokio::select! {
        res = presenter => res,
        _ = deadline => {
            info!("Run duration elapsed");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    // The presenter future may have been dropped mid-frame
    if !state.config.headless {
        restore_terminal()?;
    }
    outcome?;

    info!("Shutting down");
    Ok(())
}

/// JSON logs to the configured file, or stdout when none is set
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
