//! Raw instruction constructors for the Raydium AMM v4 swap path.

use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::domain::programs::RAYDIUM_AMM_V4;
use crate::domain::PoolKeys;

/// Instruction tag for the fixed-input swap variant
pub const SWAP_BASE_IN_TAG: u8 = 9;

/// Compute budget knobs applied when the executor does not manage fees
/// on its own.
#[derive(Debug, Clone, Copy)]
pub struct ComputeBudgetSettings {
    pub unit_limit: u32,
    pub unit_price_micro_lamports: u64,
}

impl Default for ComputeBudgetSettings {
    fn default() -> Self {
        Self {
            unit_limit: 101_337,
            unit_price_micro_lamports: 421_197,
        }
    }
}

pub fn compute_budget_pair(settings: &ComputeBudgetSettings) -> [Instruction; 2] {
    [
        ComputeBudgetInstruction::set_compute_unit_limit(settings.unit_limit),
        ComputeBudgetInstruction::set_compute_unit_price(settings.unit_price_micro_lamports),
    ]
}

/// Fixed-input swap against an AMM v4 pool. The account order is part of
/// the program's ABI; the market-side accounts come from the cached
/// OpenBook market state.
pub fn swap_base_in(
    keys: &PoolKeys,
    user_source: &Pubkey,
    user_destination: &Pubkey,
    user_owner: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_TAG);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&minimum_amount_out.to_le_bytes());

    let accounts = vec![
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new(keys.pool_account, false),
        AccountMeta::new_readonly(keys.authority, false),
        AccountMeta::new(keys.open_orders, false),
        AccountMeta::new(keys.target_orders, false),
        AccountMeta::new(keys.base_vault, false),
        AccountMeta::new(keys.quote_vault, false),
        AccountMeta::new_readonly(keys.market_program, false),
        AccountMeta::new(keys.market_id, false),
        AccountMeta::new(keys.market_bids, false),
        AccountMeta::new(keys.market_asks, false),
        AccountMeta::new(keys.market_event_queue, false),
        AccountMeta::new(keys.market_base_vault, false),
        AccountMeta::new(keys.market_quote_vault, false),
        AccountMeta::new_readonly(keys.market_vault_signer, false),
        AccountMeta::new(*user_source, false),
        AccountMeta::new(*user_destination, false),
        AccountMeta::new_readonly(*user_owner, true),
    ];

    Instruction {
        program_id: RAYDIUM_AMM_V4,
        accounts,
        data,
    }
}
