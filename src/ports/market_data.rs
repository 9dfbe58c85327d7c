//! Market Data Ports
//!
//! Read-side boundaries: live pool reserves for quoting and token/mint
//! account state for the safety filters.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::domain::{PoolKeys, ReserveSnapshot};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Reserve read failed: {0}")]
    Unavailable(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Malformed account data: {0}")]
    Malformed(String),
}

/// Live reserve reads against the chain. One call per quote; results are
/// never cached by implementations.
#[async_trait]
pub trait PoolInfoSource: Send + Sync {
    async fn fetch_pool_info(&self, keys: &PoolKeys) -> Result<ReserveSnapshot, MarketDataError>;
}

/// Decoded SPL mint fields the filters care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintInfo {
    pub supply: u64,
    pub decimals: u8,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
}

/// Token/mint account reads for filter predicates and balance checks.
#[async_trait]
pub trait TokenStateReader: Send + Sync {
    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo, MarketDataError>;

    /// Raw balance of a token account; zero when the account does not
    /// exist yet.
    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, MarketDataError>;
}
