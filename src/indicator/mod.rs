//! Momentum indicator module
//!
//! Wilder RSI over a stream of price samples, plus the discrete signal
//! derived from it.

mod feed;
mod rsi;

pub use feed::RsiFeed;
pub use rsi::Rsi;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Above this the market reads overbought
pub const OVERBOUGHT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
/// Below this the market reads oversold
pub const OVERSOLD: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// Discrete trading recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    /// Threshold an oscillator value; both boundaries map to Hold
    pub fn from_rsi(value: Decimal) -> Self {
        if value > OVERBOUGHT {
            Signal::Sell
        } else if value < OVERSOLD {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
        }
    }
}

/// One oscillator output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiReading {
    /// In [0, 100]
    pub value: Decimal,
    pub signal: Signal,
}

impl RsiReading {
    pub fn new(value: Decimal) -> Self {
        Self {
            value,
            signal: Signal::from_rsi(value),
        }
    }

    pub fn value_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or_default()
    }
}
