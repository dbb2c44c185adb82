//! Error types for the depth monitor

use thiserror::Error;

use crate::parser::DecodeError;

/// Depth monitor errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    #[error("WebSocket message error: {0}")]
    WebSocketMessage(String),

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Order book invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Indicator has not been seeded")]
    IndicatorNotSeeded,

    #[error("Indicator is already seeded")]
    IndicatorAlreadySeeded,

    #[error("Seed window must hold {expected} samples, got {got}")]
    InvalidSeedWindow { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Max reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}

impl From<tokio_tungstenite::tungstenite::Error> for MarketDataError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MarketDataError::WebSocketConnection(err.to_string())
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::ParseError(err.to_string())
    }
}

impl From<prometheus::Error> for MarketDataError {
    fn from(err: prometheus::Error) -> Self {
        MarketDataError::Metrics(err.to_string())
    }
}

impl From<std::io::Error> for MarketDataError {
    fn from(err: std::io::Error) -> Self {
        MarketDataError::Terminal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
