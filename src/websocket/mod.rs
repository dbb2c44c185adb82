//! WebSocket module for Binance connection management

mod client;
mod manager;

pub use client::WebSocketClient;
pub use manager::WebSocketManager;

use serde::Serialize;

/// Connection state published by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StreamStatus {
    Connecting,
    Live,
    Reconnecting { attempt: u32 },
    /// Gave up; the book keeps its last known state
    Failed,
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamStatus::Connecting => write!(f, "connecting"),
            StreamStatus::Live => write!(f, "live"),
            StreamStatus::Reconnecting { attempt } => write!(f, "reconnecting (attempt {})", attempt),
            StreamStatus::Failed => write!(f, "stream disconnected"),
        }
    }
}
