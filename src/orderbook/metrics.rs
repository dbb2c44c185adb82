//! Order book metrics calculation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Computed metrics for an order book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookMetrics {
    pub best_bid: Option<Decimal>,

    pub best_ask: Option<Decimal>,

    /// Mid price (average of best bid and ask)
    pub mid_price: Option<Decimal>,

    /// Spread in basis points
    pub spread_bps: Option<Decimal>,

    /// Simple imbalance: (bid_vol - ask_vol) / (bid_vol + ask_vol)
    pub imbalance: Option<Decimal>,

    /// Total bid depth (volume); `None` if the sum does not fit a Decimal
    pub bid_depth: Option<Decimal>,

    /// Total ask depth (volume)
    pub ask_depth: Option<Decimal>,

    /// Number of bid levels
    pub bid_levels: usize,

    /// Number of ask levels
    pub ask_levels: usize,
}

impl OrderBookMetrics {
    /// Check if the order book is healthy (both sides populated, not crossed)
    pub fn is_healthy(&self) -> bool {
        self.bid_levels > 0
            && self.ask_levels > 0
            && self.spread_bps.map_or(false, |s| s > Decimal::ZERO)
    }
}
