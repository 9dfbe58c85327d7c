//! Account-Change Events
//!
//! Typed events delivered by the chain subscription feed. The listener
//! adapter decodes raw account data into these before fanning them into
//! one channel; the orchestrator only ever sees decoded events.

use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;

use crate::domain::{MarketState, PoolState};

/// One account update from the subscription feed.
#[derive(Debug, Clone)]
pub enum AccountEvent {
    /// A Raydium pool account changed (usually: was created)
    Pool { account: Pubkey, state: PoolState },

    /// An OpenBook market account changed
    Market {
        account: Pubkey,
        state: MarketState,
    },

    /// One of the wallet's token accounts changed balance
    WalletToken {
        account: Pubkey,
        mint: Pubkey,
        amount: u64,
    },
}

impl AccountEvent {
    /// Short tag for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AccountEvent::Pool { .. } => "pool",
            AccountEvent::Market { .. } => "market",
            AccountEvent::WalletToken { .. } => "wallet_token",
        }
    }
}

/// Unbounded so the websocket task never blocks on a slow consumer.
pub type EventSender = mpsc::UnboundedSender<AccountEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AccountEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
