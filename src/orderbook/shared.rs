//! Lock-guarded handle shared by the ingestion and render tasks

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::error;

use super::{BatchSummary, DeltaEvent, Level, OrderBook, OrderBookMetrics, Side};
use crate::error::{MarketDataError, Result};

/// Cloneable handle to one order book behind a single RwLock.
///
/// A batch is applied under one write guard and a snapshot is taken under one
/// read guard, so readers never observe a half-applied delta.
#[derive(Debug, Clone)]
pub struct SharedOrderBook {
    inner: Arc<RwLock<OrderBook>>,
}

impl SharedOrderBook {
    pub fn new(symbol: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(OrderBook::new(symbol))),
        }
    }

    /// Apply a decoded batch and verify the levels it touched
    pub async fn apply_batch(&self, deltas: &[DeltaEvent], event_time: u64) -> BatchSummary {
        let mut book = self.inner.write().await;
        let summary = book.apply_batch(deltas, event_time);
        if let Err(e) = check_touched_levels(&book, deltas) {
            report_invariant_violation(&e);
        }
        summary
    }

    pub async fn snapshot(&self, side: Side, depth: usize) -> Vec<Level> {
        self.inner.read().await.snapshot(side, depth)
    }

    pub async fn metrics(&self, imbalance_levels: usize) -> OrderBookMetrics {
        self.inner.read().await.metrics(imbalance_levels)
    }

    /// Hold the read guard for a multi-step pass (both sides plus metrics)
    pub async fn read(&self) -> RwLockReadGuard<'_, OrderBook> {
        self.inner.read().await
    }
}

fn check_touched_levels(book: &OrderBook, deltas: &[DeltaEvent]) -> Result<()> {
    for delta in deltas {
        if let Some(volume) = book.volume_at(delta.side, delta.price) {
            if volume <= Decimal::ZERO {
                return Err(MarketDataError::InvariantViolation(format!(
                    "{} level {} stored with volume {}",
                    delta.side.as_str(),
                    delta.price,
                    volume
                )));
            }
        }
    }
    Ok(())
}

/// Loud in debug builds, logged in release builds
pub(crate) fn report_invariant_violation(err: &MarketDataError) {
    if cfg!(debug_assertions) {
        panic!("{}", err);
    }
    error!(error = %err, "Order book invariant violated");
}
