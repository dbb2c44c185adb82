//! Wilder relative strength index
//!
//! Seeded once from `periods + 1` samples, then smoothed one sample at a
//! time. A zero average loss saturates the oscillator at 100.

use rust_decimal::Decimal;

use super::RsiReading;
use crate::error::{MarketDataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RsiState {
    Unseeded,
    Seeded {
        prev_sample: Decimal,
        avg_gain: Decimal,
        avg_loss: Decimal,
    },
}

/// RSI engine with an explicit Unseeded -> Seeded transition
#[derive(Debug, Clone)]
pub struct Rsi {
    periods: usize,
    state: RsiState,
    last: Option<RsiReading>,
}

impl Rsi {
    pub fn new(periods: usize) -> Result<Self> {
        if periods == 0 {
            return Err(MarketDataError::ConfigError(
                "RSI needs at least one period".to_string(),
            ));
        }
        Ok(Self {
            periods,
            state: RsiState::Unseeded,
            last: None,
        })
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Samples needed to seed
    pub fn window_len(&self) -> usize {
        self.periods + 1
    }

    pub fn is_seeded(&self) -> bool {
        matches!(self.state, RsiState::Seeded { .. })
    }

    pub fn last_reading(&self) -> Option<RsiReading> {
        self.last
    }

    /// Seed from exactly `periods + 1` consecutive samples.
    ///
    /// Zero differences add to neither sum but still count toward the
    /// `periods` denominator.
    pub fn seed(&mut self, window: &[Decimal]) -> Result<RsiReading> {
        if self.is_seeded() {
            return Err(MarketDataError::IndicatorAlreadySeeded);
        }
        if window.len() != self.window_len() {
            return Err(MarketDataError::InvalidSeedWindow {
                expected: self.window_len(),
                got: window.len(),
            });
        }

        let (gain_sum, loss_sum) = window
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold((Decimal::ZERO, Decimal::ZERO), |(gain, loss), diff| {
                if diff > Decimal::ZERO {
                    (gain + diff, loss)
                } else {
                    (gain, loss + diff.abs())
                }
            });

        let periods = Decimal::from(self.periods as u64);
        let avg_gain = gain_sum / periods;
        let avg_loss = loss_sum / periods;
        let prev_sample = window[window.len() - 1];

        self.state = RsiState::Seeded {
            prev_sample,
            avg_gain,
            avg_loss,
        };
        Ok(self.emit(avg_gain, avg_loss))
    }

    /// Fold one more sample into the smoothed averages
    pub fn update(&mut self, sample: Decimal) -> Result<RsiReading> {
        let RsiState::Seeded {
            prev_sample,
            avg_gain,
            avg_loss,
        } = self.state
        else {
            return Err(MarketDataError::IndicatorNotSeeded);
        };

        let diff = sample - prev_sample;
        let gain = diff.max(Decimal::ZERO);
        let loss = (-diff).max(Decimal::ZERO);

        let periods = Decimal::from(self.periods as u64);
        let carry = Decimal::from(self.periods as u64 - 1);
        let avg_gain = (avg_gain * carry + gain) / periods;
        let avg_loss = (avg_loss * carry + loss) / periods;

        self.state = RsiState::Seeded {
            prev_sample: sample,
            avg_gain,
            avg_loss,
        };
        Ok(self.emit(avg_gain, avg_loss))
    }

    fn emit(&mut self, avg_gain: Decimal, avg_loss: Decimal) -> RsiReading {
        let reading = RsiReading::new(oscillator(avg_gain, avg_loss));
        self.last = Some(reading);
        reading
    }
}

/// 100 - 100 / (1 + avg_gain / avg_loss), saturating at 100 when there is no loss
fn oscillator(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::ONE_HUNDRED;
    }
    avg_gain
        .checked_div(avg_loss)
        .and_then(|rs| Decimal::ONE_HUNDRED.checked_div(Decimal::ONE + rs))
        .map(|down| Decimal::ONE_HUNDRED - down)
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
