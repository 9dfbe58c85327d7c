//! Trade Log Sink
//!
//! Append-only trade events for the external dashboard/portfolio
//! recorder. Emission is fire-and-forget: implementations must never
//! block and never fail the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeLogKind {
    Buy,
    Sell,
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeLogEntry {
    pub kind: TradeLogKind,
    pub message: String,
    pub token_mint: Option<String>,
    pub signature: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TradeLogEntry {
    pub fn new(kind: TradeLogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            token_mint: None,
            signature: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_mint(mut self, mint: &Pubkey) -> Self {
        self.token_mint = Some(mint.to_string());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

pub trait TradeLogSink: Send + Sync {
    fn emit(&self, entry: TradeLogEntry);
}

/// Default sink: writes through `tracing` and optionally forwards each
/// entry to an unbounded channel feeding the external recorder. Send
/// errors (receiver gone) are swallowed.
#[derive(Debug, Default)]
pub struct TracingTradeLog {
    forward: Option<mpsc::UnboundedSender<TradeLogEntry>>,
}

impl TracingTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forward(forward: mpsc::UnboundedSender<TradeLogEntry>) -> Self {
        Self {
            forward: Some(forward),
        }
    }
}

impl TradeLogSink for TracingTradeLog {
    fn emit(&self, entry: TradeLogEntry) {
        let mint = entry.token_mint.as_deref().unwrap_or("-");
        let signature = entry.signature.as_deref().unwrap_or("-");
        match entry.kind {
            TradeLogKind::Error => {
                error!(mint, signature, "{}", entry.message);
            }
            _ => {
                info!(mint, signature, kind = ?entry.kind, "{}", entry.message);
            }
        }
        if let Some(tx) = &self.forward {
            let _ = tx.send(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builders() {
        let mint = Pubkey::new_unique();
        let entry = TradeLogEntry::new(TradeLogKind::Buy, "confirmed buy")
            .with_mint(&mint)
            .with_signature("abc123");

        assert_eq!(entry.kind, TradeLogKind::Buy);
        assert_eq!(entry.token_mint, Some(mint.to_string()));
        assert_eq!(entry.signature.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_forwarding_sink_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = TracingTradeLog::with_forward(tx);

        sink.emit(TradeLogEntry::new(TradeLogKind::Info, "hello"));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.message, "hello");
    }

    #[test]
    fn test_emit_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = TracingTradeLog::with_forward(tx);
        // must not panic or error
        sink.emit(TradeLogEntry::new(TradeLogKind::Error, "receiver gone"));
    }
}
