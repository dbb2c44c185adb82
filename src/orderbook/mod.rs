//! Order book module
//!
//! Maintains price-level depth for one instrument from incremental depth deltas.

mod book;
mod metrics;
mod shared;

pub use book::{BatchSummary, DeltaOutcome, OrderBook};
pub use metrics::OrderBookMetrics;
pub use shared::SharedOrderBook;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// A single level in the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub volume: Decimal,
}

impl Level {
    pub fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }
}

/// New absolute volume at one price; zero removes the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEvent {
    pub side: Side,
    pub price: Decimal,
    pub volume: Decimal,
}

impl DeltaEvent {
    pub fn new(side: Side, price: Decimal, volume: Decimal) -> Self {
        Self {
            side,
            price,
            volume,
        }
    }

    pub fn ask(price: Decimal, volume: Decimal) -> Self {
        Self::new(Side::Ask, price, volume)
    }

    pub fn bid(price: Decimal, volume: Decimal) -> Self {
        Self::new(Side::Bid, price, volume)
    }

    pub fn is_removal(&self) -> bool {
        self.volume <= Decimal::ZERO
    }
}
