//! Prometheus counters for the ingestion path

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::{MarketDataError, Result};
use crate::orderbook::BatchSummary;

/// Ingestion counters registered on a crate-owned registry
#[derive(Clone)]
pub struct IngestStats {
    registry: Registry,
    pub messages: IntCounter,
    pub deltas_applied: IntCounter,
    pub levels_removed: IntCounter,
    pub decode_errors: IntCounter,
    pub samples: IntCounter,
    pub reconnects: IntCounter,
    pub bid_levels: IntGauge,
    pub ask_levels: IntGauge,
}

impl IngestStats {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("depthscope".to_string()), None)?;

        let messages = IntCounter::new("messages_total", "Stream messages received")?;
        let deltas_applied = IntCounter::new("deltas_applied_total", "Depth deltas applied")?;
        let levels_removed =
            IntCounter::new("levels_removed_total", "Price levels removed by zero-volume deltas")?;
        let decode_errors =
            IntCounter::new("decode_errors_total", "Records skipped because they failed to decode")?;
        let samples = IntCounter::new("price_samples_total", "Trade price samples received")?;
        let reconnects = IntCounter::new("reconnects_total", "Stream reconnect attempts")?;
        let bid_levels = IntGauge::new("bid_levels", "Price levels on the bid side")?;
        let ask_levels = IntGauge::new("ask_levels", "Price levels on the ask side")?;

        registry.register(Box::new(messages.clone()))?;
        registry.register(Box::new(deltas_applied.clone()))?;
        registry.register(Box::new(levels_removed.clone()))?;
        registry.register(Box::new(decode_errors.clone()))?;
        registry.register(Box::new(samples.clone()))?;
        registry.register(Box::new(reconnects.clone()))?;
        registry.register(Box::new(bid_levels.clone()))?;
        registry.register(Box::new(ask_levels.clone()))?;

        Ok(Self {
            registry,
            messages,
            deltas_applied,
            levels_removed,
            decode_errors,
            samples,
            reconnects,
            bid_levels,
            ask_levels,
        })
    }

    pub fn record_batch(&self, summary: &BatchSummary) {
        self.deltas_applied.inc_by(summary.applied() as u64);
        self.levels_removed.inc_by(summary.removed as u64);
    }

    /// Text exposition of every registered metric
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MarketDataError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counters_and_encoding() {
        let stats = IngestStats::new().unwrap();
        stats.record_batch(&BatchSummary {
            inserted: 2,
            updated: 1,
            removed: 3,
            ignored: 1,
        });
        stats.decode_errors.inc();

        assert_eq!(stats.deltas_applied.get(), 7);
        assert_eq!(stats.levels_removed.get(), 3);

        let text = stats.encode().unwrap();
        assert!(text.contains("depthscope_deltas_applied_total 7"));
        assert!(text.contains("depthscope_decode_errors_total 1"));
    }
}
