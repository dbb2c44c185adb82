//! HTTP server for health checks and metrics

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use tracing::{info, warn};

use crate::orderbook::Side;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve /health and /metrics until the process exits
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.health_port));
    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = *state.status.borrow();
    let book = state.book.read().await;

    Json(serde_json::json!({
        "status": "healthy",
        "component": "depthscope",
        "symbol": book.symbol(),
        "stream": status,
        "bid_levels": book.level_count(Side::Bid),
        "ask_levels": book.level_count(Side::Ask),
        "book_healthy": book.metrics(1).is_healthy(),
        "last_event_time": book.last_event_time(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, StatusCode> {
    {
        let book = state.book.read().await;
        state.stats.bid_levels.set(book.level_count(Side::Bid) as i64);
        state.stats.ask_levels.set(book.level_count(Side::Ask) as i64);
    }

    state.stats.encode().map_err(|e| {
        warn!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
