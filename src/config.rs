//! Configuration module for the depth monitor

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MarketDataError, Result};

const DEFAULT_WS_ENDPOINT: &str = "wss://fstream.binance.com";
const DEFAULT_LOG_FILE: &str = "depthscope.log";
const DEFAULT_STALE_TIMEOUT_MS: u64 = 45_000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Instrument to subscribe to (e.g., "BTCUSDT")
    pub symbol: String,

    /// WebSocket endpoint for Binance
    pub ws_endpoint: String,

    /// Levels shown per side
    pub depth_levels: usize,

    /// RSI lookback
    pub rsi_periods: usize,
    /// Spacing between price samples fed to the RSI
    pub rsi_sample_interval_ms: u64,

    /// Presenter redraw period
    pub render_interval_ms: u64,
    /// Status log period in headless mode
    pub status_interval_secs: u64,

    /// Reconnection settings
    pub reconnect_delay_ms: u64,
    /// Zero retries forever
    pub max_reconnect_attempts: u32,
    /// Silence after which the connection is dropped and reopened
    pub stale_timeout_ms: u64,

    /// Port for /health and /metrics
    pub health_port: u16,

    /// Skip the terminal presenter and log status lines instead
    pub headless: bool,

    /// Log destination; stdout when unset
    pub log_file: Option<String>,

    /// Stop after this many seconds
    pub run_for_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let headless = env_or("HEADLESS", false);
        // The terminal owns stdout, so logs need somewhere else to go.
        let log_file = env::var("LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .or_else(|| (!headless).then(|| DEFAULT_LOG_FILE.to_string()));

        let config = Self {
            symbol: env::var("SYMBOL")
                .unwrap_or_else(|_| "BTCUSDT".to_string())
                .trim()
                .to_uppercase(),
            ws_endpoint: env::var("WS_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_WS_ENDPOINT.to_string()),
            depth_levels: env_or("DEPTH_LEVELS", 10),
            rsi_periods: env_or("RSI_PERIODS", 14),
            rsi_sample_interval_ms: env_or("RSI_SAMPLE_INTERVAL_MS", 1000),
            render_interval_ms: env_or("RENDER_INTERVAL_MS", 16),
            status_interval_secs: env_or("STATUS_INTERVAL_SECS", 5),
            reconnect_delay_ms: env_or("RECONNECT_DELAY_MS", 1000),
            max_reconnect_attempts: env_or("MAX_RECONNECT_ATTEMPTS", 10),
            stale_timeout_ms: env_or("STALE_TIMEOUT_MS", DEFAULT_STALE_TIMEOUT_MS),
            health_port: env_or("HEALTH_PORT", 9090),
            headless,
            log_file,
            run_for_secs: env::var("RUN_FOR_SECS").ok().and_then(|v| v.parse().ok()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(MarketDataError::ConfigError("SYMBOL must not be empty".into()));
        }
        if self.depth_levels == 0 {
            return Err(MarketDataError::ConfigError("DEPTH_LEVELS must be at least 1".into()));
        }
        if self.rsi_periods == 0 {
            return Err(MarketDataError::ConfigError("RSI_PERIODS must be at least 1".into()));
        }
        if self.render_interval_ms == 0 {
            return Err(MarketDataError::ConfigError(
                "RENDER_INTERVAL_MS must be at least 1".into(),
            ));
        }
        if self.rsi_sample_interval_ms == 0 {
            return Err(MarketDataError::ConfigError(
                "RSI_SAMPLE_INTERVAL_MS must be at least 1".into(),
            ));
        }
        if self.stale_timeout_ms < 2 {
            return Err(MarketDataError::ConfigError(
                "STALE_TIMEOUT_MS must be at least 2".into(),
            ));
        }
        Ok(())
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn rsi_sample_interval(&self) -> Duration {
        Duration::from_millis(self.rsi_sample_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }

    pub fn stale_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            ws_endpoint: DEFAULT_WS_ENDPOINT.to_string(),
            depth_levels: 10,
            rsi_periods: 14,
            rsi_sample_interval_ms: 1000,
            render_interval_ms: 16,
            status_interval_secs: 5,
            reconnect_delay_ms: 1000,
            max_reconnect_attempts: 10,
            stale_timeout_ms: DEFAULT_STALE_TIMEOUT_MS,
            health_port: 9090,
            headless: false,
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
            run_for_secs: None,
        }
    }
}

/// Read and parse an environment variable, keeping the default when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
