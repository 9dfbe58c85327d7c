//! Raydium Pool State
//!
//! Fixed-offset view over the 752-byte Raydium AMM v4 pool account, the
//! assembled pool-keys structure used to build swap instructions, and the
//! cached pool record written when a new pool is accepted.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use super::market::MarketRecord;
use super::programs::{self, POOL_STATE_V4_LEN};

/// Pool status value at which the pool accepts swaps
pub const STATUS_SWAP_ENABLED: u64 = 6;

/// Byte offset of the quote mint inside the pool state, used for
/// subscription memcmp filters
pub const QUOTE_MINT_OFFSET: usize = 432;

/// Byte offset of the market program id inside the pool state
pub const MARKET_PROGRAM_OFFSET: usize = 560;

/// Errors decoding raw account data into domain records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Unexpected account data length: expected {expected}, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("No valid vault signer for market {market}")]
    InvalidVaultSigner { market: Pubkey },
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(buf)
}

/// Decoded fields of a Raydium AMM v4 pool account.
///
/// Only the fields the sniper consumes are decoded; the rest of the 752
/// bytes (fee schedule, pnl counters, order book sizing) are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub status: u64,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub pool_open_time: u64,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub open_orders: Pubkey,
    pub market_id: Pubkey,
    pub market_program: Pubkey,
    pub target_orders: Pubkey,
}

impl PoolState {
    /// Decode from raw account data (little-endian fixed offsets).
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        if data.len() != POOL_STATE_V4_LEN {
            return Err(LayoutError::Length {
                expected: POOL_STATE_V4_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            status: read_u64(data, 0),
            base_decimals: read_u64(data, 32) as u8,
            quote_decimals: read_u64(data, 40) as u8,
            pool_open_time: read_u64(data, 224),
            base_vault: read_pubkey(data, 336),
            quote_vault: read_pubkey(data, 368),
            base_mint: read_pubkey(data, 400),
            quote_mint: read_pubkey(data, QUOTE_MINT_OFFSET),
            lp_mint: read_pubkey(data, 464),
            open_orders: read_pubkey(data, 496),
            market_id: read_pubkey(data, 528),
            market_program: read_pubkey(data, MARKET_PROGRAM_OFFSET),
            target_orders: read_pubkey(data, 592),
        })
    }

    /// Whether the pool's open time has passed, i.e. it is already
    /// tradable at `now_unix`.
    pub fn is_open_at(&self, now_unix: u64) -> bool {
        self.pool_open_time <= now_unix
    }

    /// Whether the pool status permits swaps
    pub fn allows_swaps(&self) -> bool {
        self.status == STATUS_SWAP_ENABLED
    }
}

/// Full address set needed to construct a Raydium swap instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKeys {
    pub pool_account: Pubkey,
    pub authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub market_program: Pubkey,
    pub market_id: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_vault_signer: Pubkey,
}

impl PoolKeys {
    /// Combine a decoded pool state with its cached market record into the
    /// complete key set. The market vault signer is derived from the nonce
    /// stored in the market account.
    pub fn assemble(
        pool_account: Pubkey,
        state: &PoolState,
        market: &MarketRecord,
    ) -> Result<Self, LayoutError> {
        let market_vault_signer = Pubkey::create_program_address(
            &[
                market.market_id.as_ref(),
                &market.vault_signer_nonce.to_le_bytes(),
            ],
            &state.market_program,
        )
        .map_err(|_| LayoutError::InvalidVaultSigner {
            market: market.market_id,
        })?;

        Ok(Self {
            pool_account,
            authority: programs::RAYDIUM_AUTHORITY_V4,
            open_orders: state.open_orders,
            target_orders: state.target_orders,
            base_vault: state.base_vault,
            quote_vault: state.quote_vault,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            lp_mint: state.lp_mint,
            base_decimals: state.base_decimals,
            quote_decimals: state.quote_decimals,
            market_program: state.market_program,
            market_id: state.market_id,
            market_bids: market.bids,
            market_asks: market.asks,
            market_event_queue: market.event_queue,
            market_base_vault: market.base_vault,
            market_quote_vault: market.quote_vault,
            market_vault_signer,
        })
    }
}

/// Point-in-time pool reserves, in raw token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub base: u64,
    pub quote: u64,
    /// Unix seconds at which the reserves were read
    pub taken_at: i64,
}

/// Cached record for an accepted pool, written at most once per token mint.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolRecord {
    pub token_mint: Pubkey,
    pub market_id: Pubkey,
    pub pool_account: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub reserve_snapshot: ReserveSnapshot,
    pub keys: PoolKeys,
}

impl PoolRecord {
    pub fn new(keys: PoolKeys, reserve_snapshot: ReserveSnapshot) -> Self {
        Self {
            token_mint: keys.base_mint,
            market_id: keys.market_id,
            pool_account: keys.pool_account,
            base_decimals: keys.base_decimals,
            quote_decimals: keys.quote_decimals,
            reserve_snapshot,
            keys,
        }
    }
}
