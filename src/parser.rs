//! Parser module for Binance WebSocket messages
//!
//! Decodes combined-stream envelopes into typed depth batches and price
//! samples. Numeric fields inside a depth message are decoded record by
//! record so one malformed level only costs that level.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

use crate::orderbook::{DeltaEvent, Side};

/// A single malformed record, skipped and reported
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {record}: {reason}")]
pub struct DecodeError {
    pub record: String,
    pub reason: String,
}

impl DecodeError {
    fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

/// Binance depth update message
#[derive(Debug, Clone, Deserialize)]
pub struct DepthUpdate {
    /// Event type
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (milliseconds)
    #[serde(rename = "E")]
    pub event_time: u64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// First update ID in event
    #[serde(rename = "U")]
    pub first_update_id: u64,

    /// Final update ID in event
    #[serde(rename = "u")]
    pub final_update_id: u64,

    /// Bid levels, each expected to be a [price, quantity] string pair.
    /// Kept untyped so one malformed level cannot reject the whole message.
    #[serde(rename = "b", default)]
    pub bids: Vec<serde_json::Value>,

    /// Ask levels, same shape as `bids`
    #[serde(rename = "a", default)]
    pub asks: Vec<serde_json::Value>,
}

/// Deltas decoded from one depth message plus the records that failed
#[derive(Debug, Clone, Default)]
pub struct DeltaBatch {
    pub event_time: u64,
    pub deltas: Vec<DeltaEvent>,
    pub rejected: Vec<DecodeError>,
}

impl DepthUpdate {
    /// Decode every level independently, keeping the good ones
    pub fn decode(&self) -> DeltaBatch {
        let mut batch = DeltaBatch {
            event_time: self.event_time,
            deltas: Vec::with_capacity(self.bids.len() + self.asks.len()),
            rejected: Vec::new(),
        };

        for (side, levels) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
            for (index, raw) in levels.iter().enumerate() {
                match decode_level(side, raw) {
                    Ok(delta) => batch.deltas.push(delta),
                    Err(reason) => batch
                        .rejected
                        .push(DecodeError::new(format!("{}[{}]", side.as_str(), index), reason)),
                }
            }
        }

        batch
    }
}

fn decode_level(side: Side, raw: &serde_json::Value) -> Result<DeltaEvent, String> {
    let fields = raw
        .as_array()
        .ok_or_else(|| format!("expected [price, quantity], got {}", raw))?;
    let [price, volume] = fields.as_slice() else {
        return Err(format!("expected [price, quantity], got {} fields", fields.len()));
    };
    let price = decimal_field("price", price)?;
    let volume = decimal_field("quantity", volume)?;

    if price <= Decimal::ZERO {
        return Err(format!("non-positive price {}", price));
    }
    if volume < Decimal::ZERO {
        return Err(format!("negative quantity {}", volume));
    }

    Ok(DeltaEvent::new(side, price, volume))
}

/// Binance sends every level field as a decimal string
fn decimal_field(name: &str, value: &serde_json::Value) -> Result<Decimal, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("{} {} is not a string", name, value))?;
    Decimal::from_str(text).map_err(|e| format!("{} {:?}: {}", name, text, e))
}

/// Binance aggregate trade message
#[derive(Debug, Clone, Deserialize)]
pub struct AggTrade {
    /// Event type
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time
    #[serde(rename = "E")]
    pub event_time: u64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// Aggregate trade ID
    #[serde(rename = "a")]
    pub agg_trade_id: u64,

    /// Price
    #[serde(rename = "p", deserialize_with = "deserialize_decimal")]
    pub price: Decimal,

    /// Quantity
    #[serde(rename = "q", deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,

    /// Trade time
    #[serde(rename = "T")]
    pub trade_time: u64,

    /// Is buyer maker
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// One scalar price observation for the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEvent {
    pub price: Decimal,
    pub time: u64,
}

impl AggTrade {
    pub fn sample(&self) -> Result<SampleEvent, DecodeError> {
        if self.price <= Decimal::ZERO {
            return Err(DecodeError::new(
                "aggTrade price",
                format!("non-positive price {}", self.price),
            ));
        }
        Ok(SampleEvent {
            price: self.price,
            time: self.trade_time,
        })
    }
}

/// Combined stream message wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    /// Stream name
    pub stream: String,

    /// Data payload
    pub data: serde_json::Value,
}

/// Just the event type of a direct (non-envelope) message
#[derive(Debug, Deserialize)]
struct EventTag {
    #[serde(rename = "e")]
    event_type: Option<String>,
}

/// Parsed WebSocket message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Depth(DepthUpdate),
    Trade(AggTrade),
    Unknown(String),
}

impl ParsedMessage {
    /// Parse a raw WebSocket message
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        // Combined streams wrap the payload in {"stream", "data"}
        if let Ok(stream_msg) = serde_json::from_str::<StreamMessage>(raw) {
            return Self::parse_stream_data(&stream_msg.stream, stream_msg.data);
        }

        // A recognised event type that fails to deserialize is an error,
        // never silently Unknown
        match serde_json::from_str::<EventTag>(raw) {
            Ok(EventTag { event_type: Some(kind) }) if kind == "depthUpdate" => {
                Ok(ParsedMessage::Depth(serde_json::from_str(raw)?))
            }
            Ok(EventTag { event_type: Some(kind) }) if kind == "aggTrade" => {
                Ok(ParsedMessage::Trade(serde_json::from_str(raw)?))
            }
            _ => Ok(ParsedMessage::Unknown(raw.to_string())),
        }
    }

    fn parse_stream_data(stream: &str, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        if stream.contains("@depth") {
            Ok(ParsedMessage::Depth(serde_json::from_value(data)?))
        } else if stream.ends_with("@aggTrade") {
            Ok(ParsedMessage::Trade(serde_json::from_value(data)?))
        } else {
            Ok(ParsedMessage::Unknown(data.to_string()))
        }
    }
}

/// Custom deserializer for Decimal from string
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Decimal::from_str(&s).map_err(serde::de::Error::custom)
}
