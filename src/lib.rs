//! depthscope - live order book depth and RSI monitor
//!
//! This crate maintains price-level depth for one Binance instrument from its
//! depth-delta stream and derives a Wilder RSI from trade price samples.

use std::sync::Arc;
use tokio::sync::watch;

pub mod config;
pub mod error;
pub mod health;
pub mod indicator;
pub mod orderbook;
pub mod parser;
pub mod presenter;
pub mod stats;
pub mod websocket;

pub use config::Config;
pub use error::{MarketDataError, Result};
pub use indicator::{Rsi, RsiFeed, RsiReading, Signal};
pub use orderbook::{DeltaEvent, Level, OrderBook, OrderBookMetrics, SharedOrderBook, Side};
pub use parser::{DecodeError, DeltaBatch, ParsedMessage, SampleEvent};
pub use stats::IngestStats;
pub use websocket::{StreamStatus, WebSocketManager};

/// Application state shared across components
pub struct AppState {
    pub book: SharedOrderBook,
    /// Latest trade price, written by ingestion and read by the render tick
    pub samples: watch::Sender<Option<SampleEvent>>,
    pub status: watch::Sender<StreamStatus>,
    pub stats: IngestStats,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let (samples, _) = watch::channel(None);
        let (status, _) = watch::channel(StreamStatus::Connecting);

        Ok(Self {
            book: SharedOrderBook::new(&config.symbol),
            samples,
            status,
            stats: IngestStats::new()?,
            config: Arc::new(config),
        })
    }
}
