//! Sample accumulator that seeds the RSI as soon as it has a full window

use rust_decimal::Decimal;

use super::{Rsi, RsiReading};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RsiFeed {
    rsi: Rsi,
    window: Vec<Decimal>,
}

impl RsiFeed {
    pub fn new(periods: usize) -> Result<Self> {
        let rsi = Rsi::new(periods)?;
        let window = Vec::with_capacity(rsi.window_len());
        Ok(Self { rsi, window })
    }

    /// Push one sample. Returns a reading once the engine is seeded.
    pub fn push(&mut self, sample: Decimal) -> Result<Option<RsiReading>> {
        if self.rsi.is_seeded() {
            return self.rsi.update(sample).map(Some);
        }

        self.window.push(sample);
        if self.window.len() < self.rsi.window_len() {
            return Ok(None);
        }

        let reading = self.rsi.seed(&self.window)?;
        self.window = Vec::new();
        Ok(Some(reading))
    }

    pub fn is_seeded(&self) -> bool {
        self.rsi.is_seeded()
    }

    /// Samples still needed before the first reading
    pub fn samples_needed(&self) -> usize {
        if self.rsi.is_seeded() {
            0
        } else {
            self.rsi.window_len() - self.window.len()
        }
    }

    pub fn last_reading(&self) -> Option<RsiReading> {
        self.rsi.last_reading()
    }

    pub fn periods(&self) -> usize {
        self.rsi.periods()
    }
}
