//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Transaction submission (standard RPC, relay, bundle)
//! - Pool reserve and token-account reads
//! - The account-change event feed
//! - The trade-log sink consumed by the external recorder

pub mod events;
pub mod executor;
pub mod market_data;
pub mod mocks;
pub mod trade_log;

pub use events::{event_channel, AccountEvent, EventReceiver, EventSender};
pub use executor::{
    BlockhashProvider, ExecutionReceipt, ExecutorError, ExecutorKind, TransactionExecutor,
};
pub use market_data::{MarketDataError, MintInfo, PoolInfoSource, TokenStateReader};
pub use trade_log::{TradeLogEntry, TradeLogKind, TradeLogSink, TracingTradeLog};
