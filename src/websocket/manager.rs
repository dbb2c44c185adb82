//! WebSocket connection manager
//!
//! Handles reconnection logic and feeds decoded messages into the book and
//! the sample channel.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use super::{StreamStatus, WebSocketClient};
use crate::error::{MarketDataError, Result};
use crate::parser::{DecodeError, ParsedMessage};
use crate::AppState;

/// Maximum backoff delay in milliseconds (60 seconds)
const MAX_BACKOFF_MS: u64 = 60_000;

/// Manages the stream connection with automatic reconnection
pub struct WebSocketManager {
    state: Arc<AppState>,
    client: WebSocketClient,
    reconnect_attempts: u32,
}

impl WebSocketManager {
    /// Create a new WebSocket manager
    pub fn new(state: Arc<AppState>) -> Self {
        let client = WebSocketClient::new(&state.config.ws_endpoint, &state.config.symbol);

        Self {
            state,
            client,
            reconnect_attempts: 0,
        }
    }

    /// Run until reconnect attempts are exhausted.
    ///
    /// The book keeps serving its last known state after this returns.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            symbol = %self.state.config.symbol,
            max_attempts = self.state.config.max_reconnect_attempts,
            "Starting WebSocket manager"
        );

        loop {
            self.state.status.send_replace(StreamStatus::Connecting);

            match self.connect_and_process().await {
                Ok(()) => {
                    info!("WebSocket processing completed normally, reconnecting...");
                    sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    self.client.close().await;
                    self.reconnect_attempts += 1;
                    self.state.stats.reconnects.inc();

                    let max_attempts = self.state.config.max_reconnect_attempts;
                    if max_attempts > 0 && self.reconnect_attempts > max_attempts {
                        error!(
                            attempts = self.reconnect_attempts - 1,
                            "Giving up on the stream, serving last known book"
                        );
                        self.state.status.send_replace(StreamStatus::Failed);
                        return Err(MarketDataError::MaxReconnectAttemptsExceeded);
                    }

                    let delay = backoff_delay(
                        self.state.config.reconnect_delay_ms,
                        self.reconnect_attempts,
                    );
                    self.state.status.send_replace(StreamStatus::Reconnecting {
                        attempt: self.reconnect_attempts,
                    });

                    warn!(
                        attempt = self.reconnect_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnecting after error..."
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Connect and process messages
    async fn connect_and_process(&mut self) -> Result<()> {
        self.client.connect().await?;

        self.reconnect_attempts = 0;
        self.state.status.send_replace(StreamStatus::Live);
        info!("WebSocket connected successfully, resetting reconnect counter");

        // Ping halfway through the stale window; any frame counts as liveness
        let stale_after = self.state.config.stale_timeout();
        let keepalive_after = stale_after / 2;
        let mut last_frame = Instant::now();

        loop {
            match timeout(keepalive_after, self.client.recv()).await {
                Ok(Ok(Some(text))) => {
                    last_frame = Instant::now();
                    if let Err(e) = self.process_message(&text).await {
                        self.state.stats.decode_errors.inc();
                        warn!(error = %e, "Failed to process message");
                    }
                }
                Ok(Ok(None)) => last_frame = Instant::now(),
                Ok(Err(e)) => return Err(e),
                Err(_) if last_frame.elapsed() >= stale_after => {
                    warn!(
                        silent_ms = last_frame.elapsed().as_millis() as u64,
                        "Connection stale, reconnecting"
                    );
                    return Err(MarketDataError::ConnectionTimeout);
                }
                Err(_) => {
                    debug!("No frames received, sending keepalive");
                    if let Err(e) = self.client.ping().await {
                        warn!(error = %e, "Failed to send keepalive ping, reconnecting");
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Process a single WebSocket message
    async fn process_message(&self, raw: &str) -> Result<()> {
        self.state.stats.messages.inc();

        match ParsedMessage::parse(raw)? {
            ParsedMessage::Depth(update) => {
                if !update.symbol.eq_ignore_ascii_case(&self.state.config.symbol) {
                    debug!(symbol = %update.symbol, "Ignoring depth update for other symbol");
                    return Ok(());
                }

                let batch = update.decode();
                for rejected in &batch.rejected {
                    self.report_decode_error(rejected);
                }

                let summary = self
                    .state
                    .book
                    .apply_batch(&batch.deltas, batch.event_time)
                    .await;
                self.state.stats.record_batch(&summary);

                trace!(
                    update_id = update.final_update_id,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    removed = summary.removed,
                    "Depth batch applied"
                );
            }
            ParsedMessage::Trade(trade) => match trade.sample() {
                Ok(sample) => {
                    self.state.stats.samples.inc();
                    self.state.samples.send_replace(Some(sample));
                }
                Err(e) => self.report_decode_error(&e),
            },
            ParsedMessage::Unknown(msg) => {
                trace!(msg = %msg, "Unknown message type");
            }
        }

        Ok(())
    }

    fn report_decode_error(&self, err: &DecodeError) {
        self.state.stats.decode_errors.inc();
        warn!(record = %err.record, reason = %err.reason, "Skipping malformed record");
    }
}

/// Exponential backoff capped at `MAX_BACKOFF_MS`
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let delay = base_ms.saturating_mul(2u64.pow(attempt.min(6)));
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::orderbook::{Level, Side};
    use rust_decimal_macros::dec;

    fn manager() -> WebSocketManager {
        let state = AppState::new(Config::default()).unwrap();
        WebSocketManager::new(Arc::new(state))
    }

    /// Accepts WebSocket handshakes and then never sends or reads a frame
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((tcp, _)) = listener.accept().await {
                if let Ok(ws) = tokio_tungstenite::accept_async(tcp).await {
                    held.push(ws);
                }
            }
        });
        format!("ws://{}", addr)
    }

    fn silent_manager(endpoint: String) -> WebSocketManager {
        let config = Config {
            ws_endpoint: endpoint,
            stale_timeout_ms: 200,
            reconnect_delay_ms: 10,
            max_reconnect_attempts: 0,
            ..Config::default()
        };
        WebSocketManager::new(Arc::new(AppState::new(config).unwrap()))
    }

    #[test]
    fn test_backoff_caps() {
        assert_eq!(backoff_delay(1000, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(1000, 3), Duration::from_millis(8000));
        assert_eq!(backoff_delay(1000, 20), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[tokio::test]
    async fn test_silent_connection_times_out() {
        let mut manager = silent_manager(silent_server().await);

        let outcome = timeout(Duration::from_secs(5), manager.connect_and_process())
            .await
            .expect("stale connection was never abandoned");

        assert!(matches!(outcome, Err(MarketDataError::ConnectionTimeout)));
    }

    #[tokio::test]
    async fn test_silent_connection_triggers_reconnect() {
        let mut manager = silent_manager(silent_server().await);

        // Each connect succeeds, so the loop keeps cycling until cancelled
        let outcome = timeout(Duration::from_millis(1500), manager.run()).await;
        assert!(outcome.is_err());

        assert!(manager.state.stats.reconnects.get() >= 2);
    }

    #[tokio::test]
    async fn test_depth_message_reaches_book() {
        let manager = manager();
        let raw = r#"{"stream":"btcusdt@depth","data":{"e":"depthUpdate","E":7,"s":"BTCUSDT","U":1,"u":2,
            "b":[["99","2"],["98","3"],["bad","1"]],"a":[["100","0"],["101","1.5"]]}}"#;

        manager.process_message(raw).await.unwrap();

        let state = &manager.state;
        assert_eq!(
            state.book.snapshot(Side::Bid, 5).await,
            vec![Level::new(dec!(99), dec!(2)), Level::new(dec!(98), dec!(3))]
        );
        assert_eq!(
            state.book.snapshot(Side::Ask, 5).await,
            vec![Level::new(dec!(101), dec!(1.5))]
        );
        assert_eq!(state.stats.decode_errors.get(), 1);
        assert_eq!(state.stats.deltas_applied.get(), 4);
    }

    #[tokio::test]
    async fn test_trade_message_publishes_sample() {
        let manager = manager();
        let mut samples = manager.state.samples.subscribe();
        let raw = r#"{"stream":"btcusdt@aggTrade","data":{"e":"aggTrade","E":1,"s":"BTCUSDT","a":9,
            "p":"42000.10","q":"0.01","f":1,"l":1,"T":5,"m":true}}"#;

        manager.process_message(raw).await.unwrap();

        assert!(samples.has_changed().unwrap());
        let sample = (*samples.borrow_and_update()).expect("sample");
        assert_eq!(sample.price, dec!(42000.10));
        assert_eq!(manager.state.stats.samples.get(), 1);
    }

    #[tokio::test]
    async fn test_other_symbol_ignored() {
        let manager = manager();
        let raw = r#"{"e":"depthUpdate","E":7,"s":"ETHUSDT","U":1,"u":2,"b":[["99","2"]],"a":[]}"#;
        manager.process_message(raw).await.unwrap();
        assert!(manager.state.book.read().await.is_empty());
    }
}
