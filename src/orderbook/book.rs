//! Core order book implementation
//!
//! Uses BTreeMap for sorted price level management, so top-of-book
//! snapshots walk the first `depth` entries instead of sorting.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::shared::report_invariant_violation;
use super::{DeltaEvent, Level, OrderBookMetrics, Side};
use crate::error::{MarketDataError, Result};

/// What a single delta did to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Inserted,
    Updated,
    Removed,
    /// Removal for a price that was not present
    Ignored,
}

/// Per-batch tally of delta outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    pub ignored: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: DeltaOutcome) {
        match outcome {
            DeltaOutcome::Inserted => self.inserted += 1,
            DeltaOutcome::Updated => self.updated += 1,
            DeltaOutcome::Removed => self.removed += 1,
            DeltaOutcome::Ignored => self.ignored += 1,
        }
    }

    pub fn applied(&self) -> usize {
        self.inserted + self.updated + self.removed + self.ignored
    }
}

/// Order book for a single symbol
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    /// Bids sorted by price descending (highest first)
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Asks sorted by price ascending (lowest first)
    asks: BTreeMap<Decimal, Decimal>,
    /// Exchange event time of the last applied batch (milliseconds)
    last_event_time: u64,
    /// Deltas applied since creation
    deltas_applied: u64,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_event_time: 0,
            deltas_applied: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Apply one delta.
    ///
    /// A zero volume removes the level (no-op when absent); any other volume
    /// inserts or overwrites it. Negative volumes never reach the book through
    /// the decoder and are treated as removals so no stored level is ever
    /// non-positive.
    pub fn apply_delta(&mut self, delta: &DeltaEvent) -> DeltaOutcome {
        self.deltas_applied += 1;

        if delta.is_removal() {
            let removed = match delta.side {
                Side::Bid => self.bids.remove(&Reverse(delta.price)),
                Side::Ask => self.asks.remove(&delta.price),
            };
            return match removed {
                Some(_) => DeltaOutcome::Removed,
                None => DeltaOutcome::Ignored,
            };
        }

        let previous = match delta.side {
            Side::Bid => self.bids.insert(Reverse(delta.price), delta.volume),
            Side::Ask => self.asks.insert(delta.price, delta.volume),
        };
        match previous {
            Some(_) => DeltaOutcome::Updated,
            None => DeltaOutcome::Inserted,
        }
    }

    /// Apply every delta of a batch in order.
    ///
    /// Each delta stands alone: a removal anywhere in the batch never stops
    /// the entries after it from being applied.
    pub fn apply_batch(&mut self, deltas: &[DeltaEvent], event_time: u64) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for delta in deltas {
            summary.record(self.apply_delta(delta));
        }
        if event_time > self.last_event_time {
            self.last_event_time = event_time;
        }
        summary
    }

    /// Top `depth` levels of one side, best first.
    ///
    /// Returns `min(depth, level_count)` entries; asks ascend, bids descend.
    pub fn snapshot(&self, side: Side, depth: usize) -> Vec<Level> {
        let mut levels: Vec<Level> = match side {
            Side::Bid => self
                .bids
                .iter()
                .take(depth)
                .map(|(Reverse(p), v)| Level::new(*p, *v))
                .collect(),
            Side::Ask => self
                .asks
                .iter()
                .take(depth)
                .map(|(p, v)| Level::new(*p, *v))
                .collect(),
        };
        if levels.len() > depth {
            report_invariant_violation(&MarketDataError::InvariantViolation(format!(
                "{} snapshot holds {} levels for depth {}",
                side.as_str(),
                levels.len(),
                depth
            )));
            levels.truncate(depth);
        }
        levels
    }

    /// Number of levels on one side
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.len(),
            Side::Ask => self.asks.len(),
        }
    }

    /// Volume resting at an exact price
    pub fn volume_at(&self, side: Side, price: Decimal) -> Option<Decimal> {
        match side {
            Side::Bid => self.bids.get(&Reverse(price)).copied(),
            Side::Ask => self.asks.get(&price).copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first_key_value().map(|(Reverse(p), _)| *p)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first_key_value().map(|(p, _)| *p)
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid
                .checked_add(ask)
                .map(|sum| sum / Decimal::TWO),
            _ => None,
        }
    }

    /// Get spread in basis points
    ///
    /// Negative when the book is crossed.
    pub fn spread_bps(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask(), self.mid_price()) {
            (Some(bid), Some(ask), Some(mid)) if mid > Decimal::ZERO => ask
                .checked_sub(bid)?
                .checked_div(mid)?
                .checked_mul(Decimal::from(10000)),
            _ => None,
        }
    }

    /// True when best bid is at or above best ask
    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }

    /// Calculate order book imbalance at top N levels
    pub fn imbalance(&self, levels: usize) -> Option<Decimal> {
        let bid_volume = checked_sum(self.bids.values().take(levels))?;
        let ask_volume = checked_sum(self.asks.values().take(levels))?;

        let total = bid_volume.checked_add(ask_volume)?;
        if total > Decimal::ZERO {
            (bid_volume - ask_volume).checked_div(total)
        } else {
            None
        }
    }

    pub fn last_event_time(&self) -> u64 {
        self.last_event_time
    }

    pub fn deltas_applied(&self) -> u64 {
        self.deltas_applied
    }

    /// Verify that every stored level carries a positive volume
    pub fn check_invariants(&self) -> Result<()> {
        if let Some((Reverse(price), volume)) = self.bids.iter().find(|(_, v)| **v <= Decimal::ZERO) {
            return Err(MarketDataError::InvariantViolation(format!(
                "bid level {} stored with volume {}",
                price, volume
            )));
        }
        if let Some((price, volume)) = self.asks.iter().find(|(_, v)| **v <= Decimal::ZERO) {
            return Err(MarketDataError::InvariantViolation(format!(
                "ask level {} stored with volume {}",
                price, volume
            )));
        }
        Ok(())
    }

    /// Calculate order book metrics
    pub fn metrics(&self, imbalance_levels: usize) -> OrderBookMetrics {
        OrderBookMetrics {
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            mid_price: self.mid_price(),
            spread_bps: self.spread_bps(),
            imbalance: self.imbalance(imbalance_levels),
            bid_depth: checked_sum(self.bids.values()),
            ask_depth: checked_sum(self.asks.values()),
            bid_levels: self.bids.len(),
            ask_levels: self.asks.len(),
        }
    }
}

/// Sum of volumes, `None` once it leaves the Decimal range
fn checked_sum<'a>(mut volumes: impl Iterator<Item = &'a Decimal>) -> Option<Decimal> {
    volumes.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_book() -> OrderBook {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_batch(
            &[
                DeltaEvent::bid(dec!(50000), dec!(1.0)),
                DeltaEvent::bid(dec!(49999), dec!(2.0)),
                DeltaEvent::ask(dec!(50001), dec!(1.5)),
                DeltaEvent::ask(dec!(50002), dec!(2.5)),
            ],
            1000,
        );
        book
    }

    #[test]
    fn test_best_bid_ask() {
        let book = create_test_book();
        assert_eq!(book.best_bid(), Some(dec!(50000)));
        assert_eq!(book.best_ask(), Some(dec!(50001)));
    }

    #[test]
    fn test_mid_price() {
        let book = create_test_book();
        assert_eq!(book.mid_price(), Some(dec!(50000.5)));
    }

    #[test]
    fn test_imbalance() {
        let book = create_test_book();
        // Bids: 1.0 + 2.0 = 3.0, Asks: 1.5 + 2.5 = 4.0
        let imbalance = book.imbalance(10).unwrap();
        assert!((imbalance - dec!(-0.142857142857)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_add_then_remove_leaves_side_empty() {
        let mut book = OrderBook::new("BTCUSDT");
        assert_eq!(
            book.apply_delta(&DeltaEvent::ask(dec!(100.00), dec!(1.0))),
            DeltaOutcome::Inserted
        );
        assert_eq!(
            book.apply_delta(&DeltaEvent::ask(dec!(100.00), dec!(0))),
            DeltaOutcome::Removed
        );
        assert!(book.snapshot(Side::Ask, 10).is_empty());
    }

    #[test]
    fn test_bid_snapshot_truncates_to_depth() {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_batch(
            &[
                DeltaEvent::bid(dec!(99), dec!(2)),
                DeltaEvent::bid(dec!(98), dec!(3)),
                DeltaEvent::bid(dec!(97), dec!(1)),
            ],
            0,
        );
        assert_eq!(
            book.snapshot(Side::Bid, 2),
            vec![Level::new(dec!(99), dec!(2)), Level::new(dec!(98), dec!(3))]
        );
    }

    #[test]
    fn test_snapshot_never_padded() {
        let book = create_test_book();
        assert_eq!(book.snapshot(Side::Ask, 10).len(), 2);
        assert_eq!(book.snapshot(Side::Bid, 1).len(), 1);
        assert!(book.snapshot(Side::Bid, 0).is_empty());
    }

    #[test]
    fn test_snapshot_ordering() {
        let mut book = OrderBook::new("BTCUSDT");
        let prices = [dec!(10.5), dec!(9.1), dec!(12.0), dec!(11.2), dec!(9.9)];
        for price in prices {
            book.apply_delta(&DeltaEvent::ask(price, dec!(1)));
            book.apply_delta(&DeltaEvent::bid(price - dec!(5), dec!(1)));
        }

        let asks = book.snapshot(Side::Ask, 10);
        assert!(asks.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(asks[0].price, dec!(9.1));

        let bids = book.snapshot(Side::Bid, 10);
        assert!(bids.windows(2).all(|w| w[0].price >= w[1].price));
        assert_eq!(bids[0].price, dec!(7.0));
    }

    #[test]
    fn test_repeated_delta_is_idempotent() {
        let mut book = OrderBook::new("BTCUSDT");
        let delta = DeltaEvent::bid(dec!(101.25), dec!(4.2));
        book.apply_delta(&delta);
        assert_eq!(book.apply_delta(&delta), DeltaOutcome::Updated);

        assert_eq!(book.level_count(Side::Bid), 1);
        assert_eq!(
            book.snapshot(Side::Bid, 5),
            vec![Level::new(dec!(101.25), dec!(4.2))]
        );
    }

    #[test]
    fn test_removal_mid_batch_keeps_applying() {
        let mut book = create_test_book();
        let summary = book.apply_batch(
            &[
                DeltaEvent::ask(dec!(50001), dec!(0)),
                DeltaEvent::ask(dec!(50003), dec!(1.0)),
                DeltaEvent::ask(dec!(50004), dec!(0.5)),
                DeltaEvent::bid(dec!(49998), dec!(3.0)),
            ],
            2000,
        );

        assert_eq!(summary.removed, 1);
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.applied(), 4);
        assert_eq!(book.best_ask(), Some(dec!(50002)));
        assert_eq!(book.level_count(Side::Ask), 3);
        assert_eq!(book.volume_at(Side::Bid, dec!(49998)), Some(dec!(3.0)));
        assert_eq!(book.last_event_time(), 2000);
    }

    #[test]
    fn test_removed_level_stays_gone_until_readded() {
        let mut book = create_test_book();
        book.apply_delta(&DeltaEvent::bid(dec!(50000), dec!(0)));
        book.apply_delta(&DeltaEvent::bid(dec!(49999), dec!(7)));
        assert!(book
            .snapshot(Side::Bid, 10)
            .iter()
            .all(|l| l.price != dec!(50000)));

        book.apply_delta(&DeltaEvent::bid(dec!(50000), dec!(0.3)));
        assert_eq!(book.best_bid(), Some(dec!(50000)));
    }

    #[test]
    fn test_removing_absent_level_is_noop() {
        let mut book = create_test_book();
        assert_eq!(
            book.apply_delta(&DeltaEvent::ask(dec!(60000), dec!(0))),
            DeltaOutcome::Ignored
        );
        assert_eq!(book.level_count(Side::Ask), 2);
    }

    #[test]
    fn test_equal_prices_with_different_scale_share_a_level() {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_delta(&DeltaEvent::ask(dec!(100.00), dec!(1)));
        book.apply_delta(&DeltaEvent::ask(dec!(100.0), dec!(3)));
        assert_eq!(book.level_count(Side::Ask), 1);
        book.apply_delta(&DeltaEvent::ask(dec!(100), dec!(0.00000000)));
        assert_eq!(book.level_count(Side::Ask), 0);
    }

    #[test]
    fn test_crossed_book_is_tolerated() {
        let mut book = create_test_book();
        book.apply_delta(&DeltaEvent::bid(dec!(50005), dec!(1)));
        assert!(book.is_crossed());
        assert!(book.spread_bps().unwrap() < Decimal::ZERO);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_metrics() {
        let book = create_test_book();
        let metrics = book.metrics(5);
        assert_eq!(metrics.bid_depth, Some(dec!(3.0)));
        assert_eq!(metrics.ask_depth, Some(dec!(4.0)));
        assert_eq!(metrics.bid_levels, 2);
        assert_eq!(metrics.ask_levels, 2);
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_metrics_survive_volume_overflow() {
        let huge = dec!(50000000000000000000000000000);
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_batch(
            &[
                DeltaEvent::bid(dec!(100), huge),
                DeltaEvent::bid(dec!(99), huge),
                DeltaEvent::ask(dec!(101), dec!(1)),
            ],
            1,
        );

        let metrics = book.metrics(10);
        assert_eq!(metrics.bid_depth, None);
        assert_eq!(metrics.ask_depth, Some(dec!(1)));
        assert_eq!(metrics.imbalance, None);
        assert_eq!(metrics.mid_price, Some(dec!(100.5)));
        assert_eq!(metrics.bid_levels, 2);

        // A single level still fits
        assert!(book.imbalance(1).is_some());
    }

    #[test]
    fn test_mid_and_spread_at_decimal_limit() {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_delta(&DeltaEvent::bid(Decimal::MAX, dec!(1)));
        book.apply_delta(&DeltaEvent::ask(Decimal::MAX, dec!(1)));

        assert_eq!(book.mid_price(), None);
        assert_eq!(book.spread_bps(), None);
        assert!(book.is_crossed());
    }

    #[test]
    fn test_snapshot_never_exceeds_depth() {
        let book = create_test_book();
        for depth in 0..4 {
            assert!(book.snapshot(Side::Bid, depth).len() <= depth);
            assert!(book.snapshot(Side::Ask, depth).len() <= depth);
        }
    }
}
