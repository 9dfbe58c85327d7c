//! Swap Instruction Builder
//!
//! Turns a trade intent into an ordered instruction list ready for
//! signing. The quote comes from live vault reserves through the
//! `PoolInfoSource` port; when that quote cannot be produced the build
//! aborts as a whole, never emitting a partial instruction set.

pub mod instructions;

pub use instructions::{ComputeBudgetSettings, SWAP_BASE_IN_TAG};

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::quote::{apply_slippage, constant_product_out};
use crate::domain::{PoolKeys, ReserveSnapshot, TradeDirection};
use crate::ports::market_data::PoolInfoSource;

#[derive(Debug, Error)]
pub enum SwapBuildError {
    /// Reserves could not be read or produce no output for the input
    #[error("quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },
    #[error("instruction assembly failed: {0}")]
    InstructionAssembly(String),
}

/// A fully assembled swap ready to be compiled into a transaction
#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub instructions: Vec<Instruction>,
    pub amount_in: u64,
    pub quoted_out: u64,
    pub minimum_amount_out: u64,
    pub reserves: ReserveSnapshot,
}

pub struct SwapBuilder {
    pool_info: Arc<dyn PoolInfoSource>,
    compute_budget: ComputeBudgetSettings,
}

impl SwapBuilder {
    pub fn new(pool_info: Arc<dyn PoolInfoSource>, compute_budget: ComputeBudgetSettings) -> Self {
        Self {
            pool_info,
            compute_budget,
        }
    }

    /// Build the instruction list for one swap attempt.
    ///
    /// Order is fixed: compute budget (unless the executor supplies its
    /// own fees), idempotent destination ATA creation on buys, the core
    /// swap, and source account closure on sells.
    pub async fn build_swap(
        &self,
        keys: &PoolKeys,
        direction: TradeDirection,
        amount_in: u64,
        slippage_bps: u64,
        wallet: &Pubkey,
        executor_supplies_fees: bool,
    ) -> Result<SwapPlan, SwapBuildError> {
        let reserves = self
            .pool_info
            .fetch_pool_info(keys)
            .await
            .map_err(|e| SwapBuildError::QuoteUnavailable {
                reason: e.to_string(),
            })?;

        let (reserve_in, reserve_out) = match direction {
            TradeDirection::Buy => (reserves.quote, reserves.base),
            TradeDirection::Sell => (reserves.base, reserves.quote),
        };
        let quoted_out = constant_product_out(amount_in, reserve_in, reserve_out).ok_or_else(
            || SwapBuildError::QuoteUnavailable {
                reason: format!(
                    "no output for {amount_in} against reserves {reserve_in}/{reserve_out}"
                ),
            },
        )?;
        let minimum_amount_out = apply_slippage(quoted_out, slippage_bps);

        let token_ata = get_associated_token_address(wallet, &keys.base_mint);
        let quote_ata = get_associated_token_address(wallet, &keys.quote_mint);
        let (source, destination) = match direction {
            TradeDirection::Buy => (quote_ata, token_ata),
            TradeDirection::Sell => (token_ata, quote_ata),
        };

        let mut ixs = Vec::with_capacity(5);
        if !executor_supplies_fees {
            ixs.extend(instructions::compute_budget_pair(&self.compute_budget));
        }
        if direction == TradeDirection::Buy {
            ixs.push(create_associated_token_account_idempotent(
                wallet,
                wallet,
                &keys.base_mint,
                &spl_token::id(),
            ));
        }
        ixs.push(instructions::swap_base_in(
            keys,
            &source,
            &destination,
            wallet,
            amount_in,
            minimum_amount_out,
        ));
        if direction == TradeDirection::Sell {
            let close = spl_token::instruction::close_account(
                &spl_token::id(),
                &source,
                wallet,
                wallet,
                &[],
            )
            .map_err(|e| SwapBuildError::InstructionAssembly(e.to_string()))?;
            ixs.push(close);
        }

        debug!(
            direction = %direction,
            amount_in,
            quoted_out,
            minimum_amount_out,
            slippage_bps,
            "Swap plan built"
        );

        Ok(SwapPlan {
            instructions: ixs,
            amount_in,
            quoted_out,
            minimum_amount_out,
            reserves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::programs::RAYDIUM_AMM_V4;
    use crate::ports::mocks::{test_pool_keys, ScriptedPoolInfo};

    const BASE_RESERVE: u64 = 1_000_000_000_000;
    const QUOTE_RESERVE: u64 = 50_000_000_000;

    fn builder_with_reserves(base: u64, quote: u64) -> SwapBuilder {
        SwapBuilder::new(
            Arc::new(ScriptedPoolInfo::fixed(base, quote)),
            ComputeBudgetSettings::default(),
        )
    }

    fn program_ids(plan: &SwapPlan) -> Vec<Pubkey> {
        plan.instructions.iter().map(|ix| ix.program_id).collect()
    }

    #[tokio::test]
    async fn test_buy_instruction_order() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000_000, 500, &wallet, false)
            .await
            .unwrap();

        let ids = program_ids(&plan);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], solana_sdk::compute_budget::id());
        assert_eq!(ids[1], solana_sdk::compute_budget::id());
        assert_eq!(ids[2], spl_associated_token_account::id());
        assert_eq!(ids[3], RAYDIUM_AMM_V4);
    }

    #[tokio::test]
    async fn test_sell_instruction_order_closes_source() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Sell, 5_000_000, 500, &wallet, false)
            .await
            .unwrap();

        let ids = program_ids(&plan);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], solana_sdk::compute_budget::id());
        assert_eq!(ids[2], RAYDIUM_AMM_V4);
        assert_eq!(ids[3], spl_token::id());

        // the closed account is the seller's token ATA
        let close = &plan.instructions[3];
        let token_ata = get_associated_token_address(&wallet, &keys.base_mint);
        assert_eq!(close.accounts[0].pubkey, token_ata);
    }

    #[tokio::test]
    async fn test_executor_managed_fees_drop_compute_budget() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000_000, 500, &wallet, true)
            .await
            .unwrap();

        let ids = program_ids(&plan);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], spl_associated_token_account::id());
        assert_eq!(ids[1], RAYDIUM_AMM_V4);
    }

    #[tokio::test]
    async fn test_buy_quotes_quote_to_base() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let amount_in = 1_000_000_000;
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Buy, amount_in, 0, &wallet, false)
            .await
            .unwrap();

        let expected = constant_product_out(amount_in, QUOTE_RESERVE, BASE_RESERVE).unwrap();
        assert_eq!(plan.quoted_out, expected);
        // zero slippage keeps the floor at the quote
        assert_eq!(plan.minimum_amount_out, expected);
    }

    #[tokio::test]
    async fn test_sell_quotes_base_to_quote() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let amount_in = 20_000_000_000;
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Sell, amount_in, 0, &wallet, false)
            .await
            .unwrap();

        let expected = constant_product_out(amount_in, BASE_RESERVE, QUOTE_RESERVE).unwrap();
        assert_eq!(plan.quoted_out, expected);
    }

    #[tokio::test]
    async fn test_full_slippage_floors_minimum_to_zero() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000, 10_000, &wallet, false)
            .await
            .unwrap();
        assert_eq!(plan.minimum_amount_out, 0);
        assert!(plan.quoted_out > 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_build() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = SwapBuilder::new(
            Arc::new(
                ScriptedPoolInfo::fixed(0, 0)
                    .with_sequence(vec![Err("rpc timed out".to_string())]),
            ),
            ComputeBudgetSettings::default(),
        );

        let err = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000, 500, &wallet, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapBuildError::QuoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_reserves_abort_build() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(0, 0);

        let err = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000, 500, &wallet, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapBuildError::QuoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_minimum_out_in_swap_data() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let wallet = Pubkey::new_unique();
        let builder = builder_with_reserves(BASE_RESERVE, QUOTE_RESERVE);

        let plan = builder
            .build_swap(&keys, TradeDirection::Buy, 1_000_000_000, 250, &wallet, true)
            .await
            .unwrap();

        let swap_ix = plan
            .instructions
            .iter()
            .find(|ix| ix.program_id == RAYDIUM_AMM_V4)
            .unwrap();
        let encoded_min = u64::from_le_bytes(swap_ix.data[9..17].try_into().unwrap());
        assert_eq!(encoded_min, plan.minimum_amount_out);
        assert_eq!(
            plan.minimum_amount_out,
            apply_slippage(plan.quoted_out, 250)
        );
    }
}
