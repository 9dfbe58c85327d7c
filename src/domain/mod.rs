//! Domain Layer - Core types and pure logic for the pool sniper
//!
//! This module contains chain-format decoding, quote math, and trade
//! lifecycle types with no I/O. All external interactions happen through
//! the ports layer.

pub mod exit;
pub mod market;
pub mod pool;
pub mod programs;
pub mod quote;
pub mod trade;

pub use exit::{ExitSignal, ExitThresholds};
pub use market::{MarketRecord, MarketState};
pub use pool::{LayoutError, PoolKeys, PoolRecord, PoolState, ReserveSnapshot};
pub use trade::{TradeAttempt, TradeDirection, TradeState};
