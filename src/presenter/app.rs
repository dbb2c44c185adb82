//! Render-side state: pulls book snapshots and feeds the RSI on a fixed cadence

use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;
use crate::indicator::{RsiFeed, RsiReading};
use crate::orderbook::{Level, OrderBook, OrderBookMetrics, Side};
use crate::parser::SampleEvent;
use crate::websocket::StreamStatus;
use crate::AppState;

/// Everything one frame needs
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub symbol: String,
    pub asks: Vec<Level>,
    pub bids: Vec<Level>,
    pub metrics: OrderBookMetrics,
    /// Best bid at or above best ask
    pub crossed: bool,
    pub rsi: Option<RsiReading>,
    pub rsi_periods: usize,
    /// Samples still missing before the RSI is seeded
    pub samples_needed: usize,
    pub last_price: Option<Decimal>,
    pub status: StreamStatus,
}

/// Owns the indicator; the book is borrowed per tick
pub struct Dashboard {
    depth: usize,
    sample_interval: Duration,
    feed: RsiFeed,
    samples: watch::Receiver<Option<SampleEvent>>,
    status: watch::Receiver<StreamStatus>,
    next_sample_at: Option<Instant>,
    last_price: Option<Decimal>,
}

impl Dashboard {
    pub fn new(state: &AppState) -> Result<Self> {
        Self::with_parts(
            state.config.depth_levels,
            state.config.rsi_sample_interval(),
            state.config.rsi_periods,
            state.samples.subscribe(),
            state.status.subscribe(),
        )
    }

    pub fn with_parts(
        depth: usize,
        sample_interval: Duration,
        rsi_periods: usize,
        samples: watch::Receiver<Option<SampleEvent>>,
        status: watch::Receiver<StreamStatus>,
    ) -> Result<Self> {
        Ok(Self {
            depth,
            sample_interval,
            feed: RsiFeed::new(rsi_periods)?,
            samples,
            status,
            next_sample_at: None,
            last_price: None,
        })
    }

    /// One render pass over a locked book
    pub fn tick(&mut self, book: &OrderBook, now: Instant) -> DashboardView {
        self.sample(now);

        DashboardView {
            symbol: book.symbol().to_string(),
            asks: book.snapshot(Side::Ask, self.depth),
            bids: book.snapshot(Side::Bid, self.depth),
            metrics: book.metrics(self.depth),
            crossed: book.is_crossed(),
            rsi: self.feed.last_reading(),
            rsi_periods: self.feed.periods(),
            samples_needed: self.feed.samples_needed(),
            last_price: self.last_price,
            status: *self.status.borrow(),
        }
    }

    /// Feed the latest trade price once per sample interval
    fn sample(&mut self, now: Instant) {
        let Some(sample) = *self.samples.borrow_and_update() else {
            return;
        };
        self.last_price = Some(sample.price);

        if self.next_sample_at.is_some_and(|at| now < at) {
            return;
        }
        self.next_sample_at = Some(now + self.sample_interval);

        match self.feed.push(sample.price) {
            Ok(Some(reading)) => {
                debug!(rsi = %reading.value, signal = reading.signal.as_str(), "RSI updated")
            }
            Ok(None) => debug!(
                remaining = self.feed.samples_needed(),
                "Collecting RSI seed window"
            ),
            Err(e) => warn!(error = %e, "RSI update rejected"),
        }
    }
}
